use rand::seq::SliceRandom;
use rand::Rng;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ChooseError {
    #[error("Not enough choices to pick from.")]
    NotEnoughChoices,
}

/// Picks one of the comma-separated choices.
pub fn pick<'a>(input: &'a str, rng: &mut impl Rng) -> Result<&'a str, ChooseError> {
    let choices: Vec<&str> = input.split(',').map(str::trim).collect();
    if choices.len() < 2 {
        return Err(ChooseError::NotEnoughChoices);
    }
    choices
        .choose(rng)
        .copied()
        .ok_or(ChooseError::NotEnoughChoices)
}
