pub mod huggingface;
pub mod media;
pub mod openai;
pub mod provider;
