pub mod credential;
pub mod token_class;
