//! Core types and domain logic
//!
//! Everything in here is pure: no discovery, no process spawning except
//! through the [`CommandRunner`](crate::io::CommandRunner) the expander is
//! handed.

pub mod agent;
pub mod dedup;
pub mod expand;
pub mod expression;
pub mod fragment;
pub mod front_matter;
pub mod params;
pub mod selector;
pub mod skill;
pub mod value;
pub mod warning;

pub use agent::{is_agent_specific, Agent};
pub use dedup::resolve_replacements;
pub use expand::{Expander, Expansion, ExpansionContext, FragmentExpansion, FragmentSource};
pub use expression::{CompareOp, EvalError, Expression};
pub use fragment::{estimate_tokens, ExpandedFragment, Fragment, FragmentKind};
pub use front_matter::FrontMatter;
pub use params::{Params, ARGUMENTS_KEY};
pub use selector::{ExpressionMatcher, Matcher, SelectorMode, SelectorSet, Selectors};
pub use skill::{render_available_skills, Skill, SKILL_FILE};
pub use value::FrontMatterValue;
pub use warning::Warning;
