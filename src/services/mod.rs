pub mod gemini;
pub mod webflow;
