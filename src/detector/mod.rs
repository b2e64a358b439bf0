//! Page-level hover detector.
//!
//! Turns pointer events over page elements into filtered, rewritten
//! `DownloadIntent`s and reacts to the coordinator's decision.

pub mod candidate;
pub mod filter;
pub mod hover;
pub mod rewrite;

pub use candidate::{parse_css_url, Candidate, CandidateResolver, ElementPath, ElementSnapshot};
pub use filter::is_logo;
pub use hover::{Detector, HoverOutcome, HoverSettings, HoverTicket, IntentSink, PageEffects};
pub use rewrite::rewrite_high_res;
