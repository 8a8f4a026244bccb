//! The configuration profile injected at startup.
//!
//! Everything a deployment tunes lives here: the display palette, symbol
//! tags, default shape geometry, id length, and the abstraction knobs.
//! A `Profile` is handed to the graph at construction time and treated as
//! immutable from then on; operations read their optional parameters'
//! defaults from it.

/// Process-wide configuration, cloned into each graph instance.
#[derive(Clone, Debug)]
pub struct Profile {
    // ── Display palette ─────────────────────────────────────────────
    /// Fallback node color.
    pub basic_colour: String,
    /// Relators.
    pub relator_colour: String,
    /// Modes and qualities.
    pub mode_colour: String,
    /// Kinds, categories, quantities, collectives.
    pub object_colour: String,
    /// Enumerations, datatypes, abstracts.
    pub enumeration_colour: String,
    /// Events and situations.
    pub event_colour: String,
    /// Per-channel offset applied to the object color for role, phase, and
    /// subkind nodes.
    pub colour_variation: i32,

    // ── Display symbols ─────────────────────────────────────────────
    pub basic_symbol: String,
    pub relator_symbol: String,
    pub mode_symbol: String,
    pub enumeration_symbol: String,
    pub event_symbol: String,
    /// Dash pattern emitted for parthood and generalization links.
    pub stroke_dasharray: i64,

    // ── Geometry defaults ───────────────────────────────────────────
    /// Height added to an entity shape per promoted attribute.
    pub attribute_height: i64,
    pub default_width: i64,
    pub default_height: i64,
    pub default_x: i64,
    pub default_y: i64,

    // ── Identifiers and indexing ────────────────────────────────────
    /// Length of generated alphanumeric ids.
    pub id_length: usize,
    /// Separator between cleaned name and stereotype in index keys.
    pub index_delimiter: String,

    // ── Abstraction knobs ───────────────────────────────────────────
    /// Default for the `long_names` operation parameter.
    pub long_names: bool,
    /// Default for the `mult_relations` operation parameter.
    pub mult_relations: bool,
    /// Default for the `keep_relators` operation parameter.
    pub keep_relators: bool,
    /// Relators with at least this many incident edges survive aspect
    /// abstraction when `keep_relators` is set.
    pub min_relators_degree: usize,
    /// Default node budget for catalog expansion.
    pub expand_limit: usize,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            basic_colour: "#FFFFFF".into(),
            relator_colour: "#D0FFD0".into(),
            mode_colour: "#D0D0FF".into(),
            object_colour: "#FFD0D0".into(),
            enumeration_colour: "#E8E8E8".into(),
            event_colour: "#FFF4C8".into(),
            colour_variation: -16,

            basic_symbol: "circle".into(),
            relator_symbol: "diamond".into(),
            mode_symbol: "square".into(),
            enumeration_symbol: "hexagon".into(),
            event_symbol: "triangle".into(),
            stroke_dasharray: 5,

            attribute_height: 15,
            default_width: 100,
            default_height: 50,
            default_x: 40,
            default_y: 40,

            id_length: 16,
            index_delimiter: ":".into(),

            long_names: false,
            mult_relations: false,
            keep_relators: true,
            min_relators_degree: 4,
            expand_limit: 10,
        }
    }
}
