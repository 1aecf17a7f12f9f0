use socialpedia_core::{ProjectionMode, Record, RecordKind, SearchConfig};

/// Which attributes make up a record's comparison text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectionRule {
    /// Event records use `event_fields`, everything else `default_fields`
    Tagged {
        kind_field: String,
        event_kind: String,
        event_fields: Vec<String>,
        default_fields: Vec<String>,
    },
    /// Same fields for every record
    Flat { fields: Vec<String> },
}

impl ProjectionRule {
    pub fn from_config(config: &SearchConfig) -> Self {
        match config.projection {
            ProjectionMode::Tagged => ProjectionRule::Tagged {
                kind_field: config.kind_field.clone(),
                event_kind: config.event_kind.clone(),
                event_fields: config.event_fields.clone(),
                default_fields: config.default_fields.clone(),
            },
            ProjectionMode::Flat => ProjectionRule::Flat {
                fields: config.flat_fields.clone(),
            },
        }
    }

    /// Field list that applies to this record
    pub fn fields_for<'a>(&'a self, record: &Record) -> &'a [String] {
        match self {
            ProjectionRule::Tagged {
                kind_field,
                event_kind,
                event_fields,
                default_fields,
            } => match RecordKind::classify(record, kind_field, event_kind) {
                RecordKind::Event => event_fields,
                RecordKind::User => default_fields,
            },
            ProjectionRule::Flat { fields } => fields,
        }
    }
}

impl Default for ProjectionRule {
    fn default() -> Self {
        Self::from_config(&SearchConfig::default())
    }
}

/// Turns a record into the one string that gets embedded
#[derive(Debug, Clone, Default)]
pub struct FieldProjector {
    rule: ProjectionRule,
}

impl FieldProjector {
    pub fn new(rule: ProjectionRule) -> Self {
        Self { rule }
    }

    pub fn rule(&self) -> &ProjectionRule {
        &self.rule
    }

    /// Comparison text for a record, or `None` when it has nothing to compare.
    ///
    /// Values of the applicable fields are joined in field order by a single
    /// space. Only non-blank string values count; field names never appear
    /// in the output.
    pub fn project(&self, record: &Record) -> Option<String> {
        let parts: Vec<&str> = self
            .rule
            .fields_for(record)
            .iter()
            .filter_map(|field| record.get_str(field))
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .collect();

        let text = parts.join(" ");
        let text = text.trim();

        if text.is_empty() {
            None
        } else {
            Some(text.to_string())
        }
    }
}
