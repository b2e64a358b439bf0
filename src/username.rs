//! Cosmetic username generation for first-run installation.

use rand::seq::SliceRandom;
use rand::Rng;

const ADJECTIVES: &[&str] = &[
    "Swift", "Clever", "Bright", "Silent", "Mystic", "Brave", "Golden", "Arctic",
];

const NOUNS: &[&str] = &[
    "Panda", "Eagle", "Wolf", "Ranger", "Knight", "Voyager", "Phoenix", "Ghost",
];

/// Generates a name like `Swift_Panda_4821`.
pub fn generate_username() -> String {
    let mut rng = rand::thread_rng();
    let adjective = ADJECTIVES.choose(&mut rng).copied().unwrap_or("Swift");
    let noun = NOUNS.choose(&mut rng).copied().unwrap_or("Panda");
    let number: u32 = rng.gen_range(0..9999);
    format!("{}_{}_{}", adjective, noun, number)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_shape() {
        for _ in 0..50 {
            let name = generate_username();
            let parts: Vec<&str> = name.split('_').collect();
            assert_eq!(parts.len(), 3, "got: {}", name);
            assert!(ADJECTIVES.contains(&parts[0]));
            assert!(NOUNS.contains(&parts[1]));
            let number: u32 = parts[2].parse().unwrap();
            assert!(number < 9999);
        }
    }
}
