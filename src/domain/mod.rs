// ============================================================================
// Domain Layer - Draft Logic
// ============================================================================
//
// `draft` owns the order draft and its reducer. `catalog` is the read-only
// menu view the reducer validates against.
//
// Neither module performs I/O except the draft handler, which talks to
// storage through the `DraftStorage` trait.
//
// ============================================================================

pub mod catalog;
pub mod draft;
