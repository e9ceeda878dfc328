pub mod folders;
pub mod inspect;
pub mod matching;
pub mod verify;
