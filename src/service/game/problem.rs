use rand::Rng;

use super::model::Problem;

impl Problem {
    /// Generates a random arithmetic problem. Every operation keeps the
    /// answer inside [0, 99]:
    /// - addition: `a + b <= 99`
    /// - subtraction: `b <= a`, so the answer is never negative
    /// - multiplication: `a <= 11`, `b` capped so the product stays <= 99
    /// - division: dividend is built as `b * k`, so it always divides evenly
    pub fn generate(rng: &mut impl Rng) -> Problem {
        match rng.gen_range(0..4) {
            0 => {
                let a = rng.gen_range(0..=99);
                let b = rng.gen_range(0..=99 - a);
                Problem {
                    text: format!("{} + {}", a, b),
                    answer: a + b,
                }
            }
            1 => {
                let a = rng.gen_range(0..=99);
                let b = rng.gen_range(0..=a);
                Problem {
                    text: format!("{} - {}", a, b),
                    answer: a - b,
                }
            }
            2 => {
                let a: i64 = rng.gen_range(0..=11);
                let b = if a == 0 {
                    rng.gen_range(0..=99)
                } else {
                    rng.gen_range(0..=(99 / a).min(9))
                };
                Problem {
                    text: format!("{} × {}", a, b),
                    answer: a * b,
                }
            }
            _ => {
                let b: i64 = rng.gen_range(1..=9);
                let k = rng.gen_range(0..=(99 / b).min(11));
                Problem {
                    text: format!("{} ÷ {}", b * k, b),
                    answer: k,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(problem: &Problem) -> (i64, char, i64) {
        let mut parts = problem.text.split_whitespace();
        let a = parts.next().unwrap().parse().unwrap();
        let op = parts.next().unwrap().chars().next().unwrap();
        let b = parts.next().unwrap().parse().unwrap();
        (a, op, b)
    }

    #[test]
    fn test_answers_stay_in_range() {
        let mut rng = rand::thread_rng();
        for _ in 0..2000 {
            let problem = Problem::generate(&mut rng);
            assert!(
                (0..=99).contains(&problem.answer),
                "answer {} out of range for {:?}",
                problem.answer,
                problem.text
            );
        }
    }

    #[test]
    fn test_operands_match_displayed_text() {
        let mut rng = rand::thread_rng();
        for _ in 0..2000 {
            let problem = Problem::generate(&mut rng);
            let (a, op, b) = parse(&problem);
            match op {
                '+' => assert_eq!(a + b, problem.answer),
                '-' => {
                    assert!(b <= a);
                    assert_eq!(a - b, problem.answer);
                }
                '×' => {
                    assert!(a <= 11);
                    assert_eq!(a * b, problem.answer);
                }
                '÷' => {
                    assert!((1..=9).contains(&b));
                    assert!(problem.answer <= 11);
                    // exact division, no remainder
                    assert_eq!(b * problem.answer, a);
                }
                other => panic!("unexpected operator {:?}", other),
            }
        }
    }

    #[test]
    fn test_all_operations_show_up() {
        let mut rng = rand::thread_rng();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..2000 {
            let problem = Problem::generate(&mut rng);
            seen.insert(parse(&problem).1);
        }
        assert_eq!(seen.len(), 4);
    }
}
