//! The OntoUML stereotype vocabulary.
//!
//! Class and relation stereotypes are closed sets in the language, but
//! serialized models occasionally carry tags outside it; the `Other`
//! variants keep those intact across a round trip. The category predicates
//! (`is_sortal`, `is_aspect`, ...) are the membership sets every
//! transformation branches on.

// ============================================================================
// CLASS STEREOTYPES
// ============================================================================

/// Ontological category tag on a class.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ClassStereotype {
    Kind,
    Collective,
    Quantity,
    Relator,
    Quality,
    Mode,
    Subkind,
    Role,
    Phase,
    HistoricalRole,
    Category,
    Mixin,
    RoleMixin,
    PhaseMixin,
    HistoricalRoleMixin,
    Event,
    Situation,
    Type,
    Enumeration,
    Datatype,
    Abstract,
    /// Tag outside the OntoUML vocabulary, preserved verbatim.
    Other(String),
}

impl ClassStereotype {
    /// Parse a serialized stereotype tag.
    pub fn parse(tag: &str) -> Self {
        match tag {
            "kind" => Self::Kind,
            "collective" => Self::Collective,
            "quantity" => Self::Quantity,
            "relator" => Self::Relator,
            "quality" => Self::Quality,
            "mode" => Self::Mode,
            "subkind" => Self::Subkind,
            "role" => Self::Role,
            "phase" => Self::Phase,
            "historicalRole" => Self::HistoricalRole,
            "category" => Self::Category,
            "mixin" => Self::Mixin,
            "roleMixin" => Self::RoleMixin,
            "phaseMixin" => Self::PhaseMixin,
            "historicalRoleMixin" => Self::HistoricalRoleMixin,
            "event" => Self::Event,
            "situation" => Self::Situation,
            "type" => Self::Type,
            "enumeration" => Self::Enumeration,
            "datatype" => Self::Datatype,
            "abstract" => Self::Abstract,
            other => Self::Other(other.to_string()),
        }
    }

    /// The serialized tag.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Kind => "kind",
            Self::Collective => "collective",
            Self::Quantity => "quantity",
            Self::Relator => "relator",
            Self::Quality => "quality",
            Self::Mode => "mode",
            Self::Subkind => "subkind",
            Self::Role => "role",
            Self::Phase => "phase",
            Self::HistoricalRole => "historicalRole",
            Self::Category => "category",
            Self::Mixin => "mixin",
            Self::RoleMixin => "roleMixin",
            Self::PhaseMixin => "phaseMixin",
            Self::HistoricalRoleMixin => "historicalRoleMixin",
            Self::Event => "event",
            Self::Situation => "situation",
            Self::Type => "type",
            Self::Enumeration => "enumeration",
            Self::Datatype => "datatype",
            Self::Abstract => "abstract",
            Self::Other(tag) => tag,
        }
    }

    /// Classes that do not provide a principle of identity.
    pub fn is_non_sortal(&self) -> bool {
        matches!(
            self,
            Self::Category
                | Self::Mixin
                | Self::PhaseMixin
                | Self::RoleMixin
                | Self::HistoricalRoleMixin
        )
    }

    /// Classes that provide (or inherit) a principle of identity.
    pub fn is_sortal(&self) -> bool {
        matches!(
            self,
            Self::Kind
                | Self::Collective
                | Self::Quantity
                | Self::Relator
                | Self::Quality
                | Self::Mode
                | Self::Subkind
                | Self::Phase
                | Self::Role
                | Self::HistoricalRole
        )
    }

    /// The identity-supplying top of a sortal hierarchy. Upward hierarchy
    /// traversals stop here.
    pub fn is_kind_level(&self) -> bool {
        matches!(
            self,
            Self::Kind
                | Self::Collective
                | Self::Quantity
                | Self::Relator
                | Self::Quality
                | Self::Mode
        )
    }

    /// Reified relationships and intrinsic moments: relator, quality, mode.
    pub fn is_aspect(&self) -> bool {
        matches!(self, Self::Relator | Self::Quality | Self::Mode)
    }

    /// Endurant classes plus datatypes; the stereotypes whose relations
    /// survive aspect abstraction.
    pub fn is_endurant_or_datatype(&self) -> bool {
        self.is_sortal() || self.is_non_sortal() || matches!(self, Self::Datatype)
    }

    /// Aspects and events; excluded from long-name prefixing.
    pub fn is_not_object(&self) -> bool {
        self.is_aspect() || matches!(self, Self::Event)
    }
}

impl std::fmt::Display for ClassStereotype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// RELATION STEREOTYPES
// ============================================================================

/// Ontological category tag on a relation.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum RelationStereotype {
    Material,
    Derivation,
    Comparative,
    Mediation,
    Characterization,
    ExternalDependence,
    ComponentOf,
    MemberOf,
    SubCollectionOf,
    SubQuantityOf,
    Instantiation,
    Termination,
    Participational,
    Participation,
    HistoricalDependence,
    Creation,
    Manifestation,
    BringsAbout,
    Triggers,
    /// Tag outside the OntoUML vocabulary, preserved verbatim.
    Other(String),
}

impl RelationStereotype {
    /// Parse a serialized stereotype tag.
    pub fn parse(tag: &str) -> Self {
        match tag {
            "material" => Self::Material,
            "derivation" => Self::Derivation,
            "comparative" => Self::Comparative,
            "mediation" => Self::Mediation,
            "characterization" => Self::Characterization,
            "externalDependence" => Self::ExternalDependence,
            "componentOf" => Self::ComponentOf,
            "memberOf" => Self::MemberOf,
            "subCollectionOf" => Self::SubCollectionOf,
            "subQuantityOf" => Self::SubQuantityOf,
            "instantiation" => Self::Instantiation,
            "termination" => Self::Termination,
            "participational" => Self::Participational,
            "participation" => Self::Participation,
            "historicalDependence" => Self::HistoricalDependence,
            "creation" => Self::Creation,
            "manifestation" => Self::Manifestation,
            "bringsAbout" => Self::BringsAbout,
            "triggers" => Self::Triggers,
            other => Self::Other(other.to_string()),
        }
    }

    /// The serialized tag.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Material => "material",
            Self::Derivation => "derivation",
            Self::Comparative => "comparative",
            Self::Mediation => "mediation",
            Self::Characterization => "characterization",
            Self::ExternalDependence => "externalDependence",
            Self::ComponentOf => "componentOf",
            Self::MemberOf => "memberOf",
            Self::SubCollectionOf => "subCollectionOf",
            Self::SubQuantityOf => "subQuantityOf",
            Self::Instantiation => "instantiation",
            Self::Termination => "termination",
            Self::Participational => "participational",
            Self::Participation => "participation",
            Self::HistoricalDependence => "historicalDependence",
            Self::Creation => "creation",
            Self::Manifestation => "manifestation",
            Self::BringsAbout => "bringsAbout",
            Self::Triggers => "triggers",
            Self::Other(tag) => tag,
        }
    }
}

impl std::fmt::Display for RelationStereotype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// AGGREGATION
// ============================================================================

/// Aggregation marker on a relation endpoint. Anything other than `None`
/// makes the owning relation a parthood.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AggregationKind {
    #[default]
    None,
    Shared,
    Composite,
}

impl AggregationKind {
    /// True for `SHARED` and `COMPOSITE`.
    pub fn is_aggregated(&self) -> bool {
        !matches!(self, Self::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_round_trip() {
        for tag in [
            "kind",
            "roleMixin",
            "historicalRoleMixin",
            "enumeration",
            "datatype",
        ] {
            assert_eq!(ClassStereotype::parse(tag).as_str(), tag);
        }
        for tag in ["mediation", "componentOf", "bringsAbout"] {
            assert_eq!(RelationStereotype::parse(tag).as_str(), tag);
        }
    }

    #[test]
    fn unknown_tags_survive() {
        let tag = ClassStereotype::parse("powertype");
        assert_eq!(tag, ClassStereotype::Other("powertype".into()));
        assert_eq!(tag.as_str(), "powertype");
        assert!(!tag.is_sortal());
    }

    #[test]
    fn category_sets_do_not_overlap() {
        let sortals = [
            "kind",
            "collective",
            "quantity",
            "relator",
            "quality",
            "mode",
            "subkind",
            "phase",
            "role",
            "historicalRole",
        ];
        let non_sortals = [
            "category",
            "mixin",
            "phaseMixin",
            "roleMixin",
            "historicalRoleMixin",
        ];
        for tag in sortals {
            let s = ClassStereotype::parse(tag);
            assert!(s.is_sortal(), "{tag} should be sortal");
            assert!(!s.is_non_sortal());
            assert!(s.is_endurant_or_datatype());
        }
        for tag in non_sortals {
            let s = ClassStereotype::parse(tag);
            assert!(s.is_non_sortal(), "{tag} should be non-sortal");
            assert!(!s.is_sortal());
            assert!(s.is_endurant_or_datatype());
        }
    }

    #[test]
    fn aspects_are_kind_level() {
        for tag in ["relator", "quality", "mode"] {
            let s = ClassStereotype::parse(tag);
            assert!(s.is_aspect());
            assert!(s.is_kind_level());
            assert!(s.is_not_object());
        }
        assert!(ClassStereotype::Event.is_not_object());
        assert!(!ClassStereotype::Kind.is_not_object());
    }
}
