//! TOML conversion profiles.
//!
//! A profile describes one end-to-end conversion for a tenant: the header
//! layout of every stage, the rule bindings between them, fixed values and
//! output settings.
//!
//! ```toml
//! tenant_id = 1
//! input_format = "CSV_C_SJIS"
//!
//! [layouts]
//! input = [{ name = "生年月日", index = 0 }]
//! display = [{ name = "生年月日", index = 0, edit = true }]
//! system_output = [{ name = "BIRTH", index = 0 }]
//!
//! [rules]
//! display = [{ rule = "DATE1", source = 0, destination = 0 }]
//! system_output = [{ rule = "DATE2", source = 0, destination = 0 }]
//!
//! [output]
//! system_format = "CSV_C_SJIS"
//! archive = true
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use convert_ingest::{EncodingFallback, FileFormatId, TextEncoding};
use convert_map::RuleSet;
use convert_model::{HeaderDescriptor, RuleBinding, Stage, StageLayout, TenantId};
use convert_output::{DEFAULT_SHEET_NAME, SubstitutionTable};
use convert_rules::{FixedValueRecord, InMemoryFixedValues};
use serde::Deserialize;

use crate::error::{CoreError, Result};
use crate::store::DEFAULT_BATCH_TTL;

fn default_batch_ttl_secs() -> u64 {
    DEFAULT_BATCH_TTL.as_secs()
}

fn default_encodings() -> Vec<TextEncoding> {
    EncodingFallback::default().order().to_vec()
}

fn default_system_format() -> FileFormatId {
    FileFormatId::CsvCommaUtf8
}

fn default_sheet_name() -> String {
    DEFAULT_SHEET_NAME.to_string()
}

fn default_file_stem() -> String {
    "output".to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConversionProfile {
    #[serde(default)]
    pub tenant_id: TenantId,
    /// Pins the input format; detected per file when absent.
    #[serde(default)]
    pub input_format: Option<FileFormatId>,
    /// Worker threads; available parallelism when absent.
    #[serde(default)]
    pub workers: Option<usize>,
    #[serde(default = "default_batch_ttl_secs")]
    pub batch_ttl_secs: u64,
    /// Encoding fallback order for text input.
    #[serde(default = "default_encodings")]
    pub encodings: Vec<TextEncoding>,
    /// Keep session batches after the outputs are written.
    #[serde(default)]
    pub keep_batches: bool,
    pub layouts: ProfileLayouts,
    pub rules: ProfileRules,
    #[serde(default)]
    pub output: OutputSettings,
    #[serde(default)]
    pub fixed_values: Vec<FixedValueRecord>,
    /// Single character → replacement, layered over the default table.
    #[serde(default)]
    pub substitutions: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileLayouts {
    pub input: Vec<HeaderDescriptor>,
    pub display: Vec<HeaderDescriptor>,
    pub system_output: Vec<HeaderDescriptor>,
    #[serde(default)]
    pub agency_output: Vec<HeaderDescriptor>,
}

/// Bindings keyed by the stage they produce.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileRules {
    pub display: Vec<RuleBinding>,
    pub system_output: Vec<RuleBinding>,
    #[serde(default)]
    pub agency_output: Vec<RuleBinding>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputSettings {
    #[serde(default = "default_system_format")]
    pub system_format: FileFormatId,
    #[serde(default)]
    pub agency_format: Option<FileFormatId>,
    #[serde(default = "default_sheet_name")]
    pub sheet_name: String,
    #[serde(default)]
    pub archive: bool,
    #[serde(default = "default_file_stem")]
    pub file_stem: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            system_format: default_system_format(),
            agency_format: None,
            sheet_name: default_sheet_name(),
            archive: false,
            file_stem: default_file_stem(),
        }
    }
}

fn invalid(message: impl Into<String>) -> CoreError {
    CoreError::InvalidProfile {
        message: message.into(),
    }
}

impl ConversionProfile {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| CoreError::ProfileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents, path)
    }

    /// Parses profile text; `origin` names it in errors.
    pub fn parse(contents: &str, origin: &Path) -> Result<Self> {
        let profile: Self = toml::from_str(contents).map_err(|source| CoreError::ProfileParse {
            path: PathBuf::from(origin),
            source,
        })?;
        profile.validate()?;
        Ok(profile)
    }

    pub fn layout(&self, stage: Stage) -> Result<StageLayout> {
        let headers = match stage {
            Stage::Input => &self.layouts.input,
            Stage::Display => &self.layouts.display,
            Stage::SystemOutput => &self.layouts.system_output,
            Stage::AgencyOutput => &self.layouts.agency_output,
        };
        Ok(StageLayout::new(stage, headers.clone())?)
    }

    /// Bindings producing `stage`, read from the stage before it.
    pub fn bindings(&self, stage: Stage) -> &[RuleBinding] {
        match stage {
            Stage::Input => &[],
            Stage::Display => &self.rules.display,
            Stage::SystemOutput => &self.rules.system_output,
            Stage::AgencyOutput => &self.rules.agency_output,
        }
    }

    /// Stage whose rows feed `stage`.
    pub fn source_stage(stage: Stage) -> Option<Stage> {
        match stage {
            Stage::Input => None,
            Stage::Display => Some(Stage::Input),
            Stage::SystemOutput | Stage::AgencyOutput => Some(Stage::Display),
        }
    }

    pub fn has_agency_output(&self) -> bool {
        !self.rules.agency_output.is_empty()
    }

    pub fn batch_ttl(&self) -> Duration {
        Duration::from_secs(self.batch_ttl_secs)
    }

    pub fn encoding_fallback(&self) -> EncodingFallback {
        EncodingFallback::new(self.encodings.clone())
    }

    pub fn substitution_table(&self) -> Result<SubstitutionTable> {
        let mut overrides = Vec::with_capacity(self.substitutions.len());
        for (from, to) in &self.substitutions {
            let mut chars = from.chars();
            match (chars.next(), chars.next()) {
                (Some(ch), None) => overrides.push((ch, to.clone())),
                _ => {
                    return Err(invalid(format!(
                        "substitution key '{from}' must be a single character"
                    )));
                }
            }
        }
        Ok(SubstitutionTable::with_overrides(overrides))
    }

    /// Fixed values of this profile, all owned by the profile's tenant.
    pub fn fixed_value_source(&self) -> Result<InMemoryFixedValues> {
        let records = self.fixed_values.iter().cloned().map(|record| FixedValueRecord {
            tenant_id: self.tenant_id,
            ..record
        });
        Ok(InMemoryFixedValues::from_records(records)?)
    }

    /// Checks layouts, rule sets and settings without running anything.
    pub fn validate(&self) -> Result<()> {
        if self.encodings.is_empty() {
            return Err(invalid("encodings must list at least one encoding"));
        }
        if self.workers == Some(0) {
            return Err(invalid("workers must be at least 1"));
        }
        if self.output.system_format == FileFormatId::Pdf
            || self.output.agency_format == Some(FileFormatId::Pdf)
        {
            return Err(invalid("PDF is an input-only format"));
        }

        let mut stages = vec![Stage::Display, Stage::SystemOutput];
        if self.has_agency_output() {
            stages.push(Stage::AgencyOutput);
        } else if self.output.agency_format.is_some() {
            return Err(invalid("agency_format is set but there are no agency_output rules"));
        }
        for stage in stages {
            let source = Self::source_stage(stage).unwrap_or(Stage::Input);
            let before = self.layout(source)?;
            let after = self.layout(stage)?;
            RuleSet::compile(self.bindings(stage), &before, &after)?;
        }

        self.substitution_table()?;
        self.fixed_value_source()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROFILE: &str = r#"
tenant_id = 7

[layouts]
input = [{ header_name = "氏名", index_value = 0 }, { name = "性別", index = 1 }]
display = [{ name = "性別", index = 0 }, { name = "氏名", index = 1, edit = true }]
system_output = [{ name = "SEX", index = 0 }]

[rules]
display = [
    { rule = "NOT_CHANGE", source = 0, destination = 1 },
    { rule = "GENDER_12", source = 1, destination = 0 },
]
system_output = [{ rule = "GENDER_MF", source = 0, destination = 0 }]

[[fixed_values]]
rule = "GROUP_NO"
before = "A"
after = "G-01"

[substitutions]
"①" = "1"
"#;

    fn parse(text: &str) -> Result<ConversionProfile> {
        ConversionProfile::parse(text, Path::new("test.toml"))
    }

    #[test]
    fn test_parse_with_defaults() {
        let profile = parse(PROFILE).unwrap();
        assert_eq!(profile.tenant_id, TenantId(7));
        assert_eq!(profile.batch_ttl(), DEFAULT_BATCH_TTL);
        assert_eq!(profile.output.system_format, FileFormatId::CsvCommaUtf8);
        assert_eq!(profile.output.sheet_name, "Sheet1");
        assert_eq!(profile.encodings.len(), 4);
        assert!(!profile.has_agency_output());

        let display = profile.layout(Stage::Display).unwrap();
        assert_eq!(display.names().collect::<Vec<_>>(), ["性別", "氏名"]);
        assert_eq!(profile.bindings(Stage::Display).len(), 2);
        assert_eq!(profile.fixed_values[0].before, "A");
        assert_eq!(
            profile.substitution_table().unwrap().get('①'),
            Some("1")
        );
    }

    #[test]
    fn test_duplicate_destination_is_a_config_error() {
        let text = PROFILE.replace(
            "{ rule = \"GENDER_12\", source = 1, destination = 0 }",
            "{ rule = \"GENDER_12\", source = 1, destination = 1 }",
        );
        let error = parse(&text).unwrap_err();
        assert!(error.is_configuration());
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let error = parse(&format!("bogus = 1\n{PROFILE}")).unwrap_err();
        assert!(matches!(error, CoreError::ProfileParse { .. }));
    }

    #[test]
    fn test_multi_character_substitution_key() {
        let text = PROFILE.replace("\"①\" = \"1\"", "\"①②\" = \"12\"");
        assert!(matches!(parse(&text), Err(CoreError::InvalidProfile { .. })));
    }
}
