//! Static question bank served to every room
//!
//! Questions are immutable and shared by all sessions; a session only ever
//! holds an index into this bank. The full `Question` (including the answer
//! key) stays server-side, and `Question::view` produces the payload that is
//! safe to send to clients.

use shared::QuestionView;

/// A single quiz question, answer key included.
#[derive(Debug, Clone)]
pub struct Question {
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_index: usize,
    pub time_limit: u32,
}

impl Question {
    pub fn new(prompt: &str, options: [&str; 4], correct_index: usize, time_limit: u32) -> Self {
        Self {
            prompt: prompt.to_string(),
            options: options.iter().map(|s| s.to_string()).collect(),
            correct_index,
            time_limit,
        }
    }

    /// Builds the client-facing payload for this question. The correct index
    /// is intentionally absent.
    pub fn view(&self, index: usize, total: usize) -> QuestionView {
        QuestionView {
            prompt: self.prompt.clone(),
            options: self.options.clone(),
            index,
            total,
            time_limit: self.time_limit,
        }
    }
}

/// The built-in bank: arithmetic sequences and series, 30 seconds each.
pub fn default_bank() -> Vec<Question> {
    vec![
        Question::new(
            "Find the next term: 2, 5, 8, 11, ...",
            ["13", "14", "15", "16"],
            1,
            30,
        ),
        Question::new(
            "Find the 10th term of: 3, 7, 11, 15, ...",
            ["35", "39", "43", "47"],
            1,
            30,
        ),
        Question::new(
            "Sum of first 5 terms: 2, 4, 6, 8, 10",
            ["20", "25", "30", "35"],
            2,
            30,
        ),
        Question::new(
            "Find the common difference: 10, 7, 4, 1, ...",
            ["3", "-3", "2", "-2"],
            1,
            30,
        ),
        Question::new(
            "If a1=5 and d=2, find a20",
            ["43", "45", "41", "39"],
            0,
            30,
        ),
        Question::new(
            "Identify the arithmetic sequence:",
            ["1, 2, 4, 8", "1, 3, 5, 7", "1, 1, 2, 3", "1, 4, 9, 16"],
            1,
            30,
        ),
        Question::new(
            "Find n if an=25 for 5, 10, 15, ...",
            ["4", "5", "6", "7"],
            1,
            30,
        ),
        Question::new(
            "Sum of first 4 terms of 1, 3, 5, 7",
            ["15", "16", "17", "18"],
            1,
            30,
        ),
        Question::new(
            "Find a1 if a5=20 and d=3",
            ["5", "8", "11", "14"],
            1,
            30,
        ),
        Question::new(
            "What is the 100th term of 1, 2, 3, ...?",
            ["99", "100", "101", "102"],
            1,
            30,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bank_size() {
        assert_eq!(default_bank().len(), 10);
    }

    #[test]
    fn test_bank_questions_are_well_formed() {
        for question in default_bank() {
            assert!(!question.prompt.is_empty());
            assert_eq!(question.options.len(), 4);
            assert!(question.correct_index < question.options.len());
            assert!(question.time_limit > 0);
        }
    }

    #[test]
    fn test_view_carries_prompt_and_position() {
        let bank = default_bank();
        let view = bank[2].view(2, bank.len());

        assert_eq!(view.prompt, bank[2].prompt);
        assert_eq!(view.options, bank[2].options);
        assert_eq!(view.index, 2);
        assert_eq!(view.total, 10);
        assert_eq!(view.time_limit, 30);
    }
}
