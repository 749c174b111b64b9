//! The activity's tiny data-lookup language: `{{Event.<key>.<field>}}`
//! bindings resolved against the journey payload, and `%%field%%`
//! placeholders substituted into message templates.

pub mod personalize;
pub mod resolver;

pub use personalize::personalize;
pub use resolver::resolve;
