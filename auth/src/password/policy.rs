/// Password strength rules applied on registration, profile update and reset.
///
/// A password passes when it is long enough and mixes enough character classes
/// (lowercase, uppercase, digit, symbol).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub max_length: usize,
    pub min_character_classes: usize,
}

impl PasswordPolicy {
    pub const fn new(min_length: usize, max_length: usize, min_character_classes: usize) -> Self {
        Self {
            min_length,
            max_length,
            min_character_classes,
        }
    }

    /// Check a candidate password.
    ///
    /// # Returns
    /// Every violated rule as a human-readable message (empty when the password passes)
    pub fn violations(&self, password: &str) -> Vec<String> {
        let mut violations = Vec::new();
        let length = password.chars().count();

        if length < self.min_length {
            violations.push(format!(
                "must be at least {} characters long",
                self.min_length
            ));
        }
        if length > self.max_length {
            violations.push(format!(
                "must be at most {} characters long",
                self.max_length
            ));
        }

        let classes = character_classes(password);
        if classes < self.min_character_classes {
            violations.push(format!(
                "must contain at least {} of: lowercase letters, uppercase letters, digits, symbols",
                self.min_character_classes
            ));
        }

        violations
    }

    pub fn is_satisfied_by(&self, password: &str) -> bool {
        self.violations(password).is_empty()
    }
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self::new(8, 128, 2)
    }
}

fn character_classes(password: &str) -> usize {
    let lower = password.chars().any(|c| c.is_lowercase());
    let upper = password.chars().any(|c| c.is_uppercase());
    let digit = password.chars().any(|c| c.is_ascii_digit());
    let symbol = password
        .chars()
        .any(|c| !c.is_alphanumeric() && !c.is_whitespace());

    [lower, upper, digit, symbol].into_iter().filter(|&b| b).count()
}
