//! Scalar value transforms
//!
//! Pure conversions from HL7 v2 primitive and composite encodings to
//! FHIR-shaped values. Every function rejects malformed input with a
//! [`ValueTransformError`] instead of guessing.

use crate::domain::ValueTransformError;
use chrono::{FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use serde::Serialize;
use serde_json::{json, Value};
use std::ops::RangeInclusive;
use std::str::FromStr;
use std::sync::OnceLock;

/// HL7 v2 table 0203 (identifier type)
pub const IDENTIFIER_TYPE_SYSTEM: &str = "http://terminology.hl7.org/CodeSystem/v2-0203";
/// HL7 v3 ActCode (encounter class)
pub const ACT_CODE_SYSTEM: &str = "http://terminology.hl7.org/CodeSystem/v3-ActCode";
/// UCUM units
pub const UCUM_SYSTEM: &str = "http://unitsofmeasure.org";
/// Observation category code system
pub const OBSERVATION_CATEGORY_SYSTEM: &str =
    "http://terminology.hl7.org/CodeSystem/observation-category";

const LOINC_SYSTEM: &str = "http://loinc.org";
const SNOMED_SYSTEM: &str = "http://snomed.info/sct";

/// FHIR Coding
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Coding {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl Coding {
    fn new(system: &str, code: &str) -> Self {
        Self {
            system: Some(system.to_string()),
            code: Some(code.to_string()),
            display: None,
        }
    }
}

/// FHIR CodeableConcept
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CodeableConcept {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub coding: Vec<Coding>,
}

/// FHIR Identifier
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Identifier {
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(rename = "type")]
    pub identifier_type: CodeableConcept,
}

/// FHIR HumanName (family and given parts)
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct HumanName {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub given: Vec<String>,
}

/// FHIR Quantity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quantity {
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub system: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

fn timestamp_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"^(?P<Y>\d{4})(?P<M>\d{2})?(?P<D>\d{2})?(?:(?P<h>\d{2})(?P<m>\d{2})?(?P<s>\d{2})?)?(?:\.(?P<frac>\d+))?(?P<tz>Z|[+-]\d{4})?$",
        )
        .expect("timestamp pattern is valid")
    })
}

fn suffix_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?:\.\d+)?(?P<tz>Z|[+-]\d{4})?$").expect("suffix pattern is valid")
    })
}

/// Split a TS into its leading digit run and the optional fraction/offset
/// suffix, rejecting anything else.
fn split_timestamp<'a>(
    transform: &'static str,
    ts: &'a str,
) -> Result<(&'a str, Option<&'a str>), ValueTransformError> {
    let ts = ts.trim();
    if ts.is_empty() {
        return Err(ValueTransformError::EmptyInput { transform });
    }
    let digits_end = ts
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(ts.len());
    let (digits, rest) = ts.split_at(digits_end);

    let invalid = || ValueTransformError::InvalidFormat {
        transform,
        value: ts.to_string(),
    };
    if digits.len() > 14 {
        return Err(invalid());
    }
    let captures = suffix_pattern().captures(rest).ok_or_else(invalid)?;
    let tz = captures.name("tz").map(|m| m.as_str());
    Ok((digits, tz))
}

/// HL7 TS to FHIR date, keeping the available precision
///
/// `YYYYMMDD...` gives `YYYY-MM-DD`, `YYYYMM` gives `YYYY-MM` and `YYYY`
/// gives `YYYY`.
///
/// # Example
///
/// ```
/// use hl7bridge::core::mapping::values::ts_to_date;
///
/// assert_eq!(ts_to_date("20250130").unwrap(), "2025-01-30");
/// assert_eq!(ts_to_date("202501").unwrap(), "2025-01");
/// assert!(ts_to_date("").is_err());
/// ```
pub fn ts_to_date(ts: &str) -> Result<String, ValueTransformError> {
    const NAME: &str = "ts_to_date";
    let (digits, _) = split_timestamp(NAME, ts)?;
    let invalid = || ValueTransformError::InvalidFormat {
        transform: NAME,
        value: ts.to_string(),
    };

    if digits.len() >= 8 {
        let date = NaiveDate::parse_from_str(&digits[..8], "%Y%m%d").map_err(|_| invalid())?;
        return Ok(date.format("%Y-%m-%d").to_string());
    }
    if digits.len() >= 6 {
        let year: i32 = digits[..4].parse().map_err(|_| invalid())?;
        let month: u32 = digits[4..6].parse().map_err(|_| invalid())?;
        NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
        return Ok(format!("{}-{}", &digits[..4], &digits[4..6]));
    }
    if digits.len() >= 4 {
        return Ok(digits[..4].to_string());
    }
    Err(ValueTransformError::InsufficientPrecision {
        transform: NAME,
        value: ts.to_string(),
        required: 4,
    })
}

/// HL7 TS to FHIR instant with seconds precision
///
/// Requires `YYYYMMDDHHMMSS`. A trailing `±HHMM` offset is carried into the
/// result; without one the instant is rendered in UTC.
///
/// # Example
///
/// ```
/// use hl7bridge::core::mapping::values::ts_to_instant;
///
/// assert_eq!(
///     ts_to_instant("20250130123045-0500").unwrap(),
///     "2025-01-30T12:30:45-05:00"
/// );
/// assert_eq!(ts_to_instant("20250130123045").unwrap(), "2025-01-30T12:30:45Z");
/// ```
pub fn ts_to_instant(ts: &str) -> Result<String, ValueTransformError> {
    const NAME: &str = "ts_to_instant";
    let (digits, tz) = split_timestamp(NAME, ts)?;
    if digits.len() < 14 {
        return Err(ValueTransformError::InsufficientPrecision {
            transform: NAME,
            value: ts.to_string(),
            required: 14,
        });
    }
    let invalid = || ValueTransformError::InvalidFormat {
        transform: NAME,
        value: ts.to_string(),
    };

    let naive = NaiveDateTime::parse_from_str(digits, "%Y%m%d%H%M%S").map_err(|_| invalid())?;
    match tz {
        None | Some("Z") => Ok(Utc
            .from_utc_datetime(&naive)
            .format("%Y-%m-%dT%H:%M:%SZ")
            .to_string()),
        Some(offset) => {
            let offset = parse_offset(offset).ok_or_else(invalid)?;
            let instant = offset
                .from_local_datetime(&naive)
                .single()
                .ok_or_else(invalid)?;
            Ok(instant.format("%Y-%m-%dT%H:%M:%S%:z").to_string())
        }
    }
}

fn parse_offset(raw: &str) -> Option<FixedOffset> {
    let sign = match raw.as_bytes().first()? {
        b'+' => 1,
        b'-' => -1,
        _ => return None,
    };
    let hours: i32 = raw.get(1..3)?.parse().ok()?;
    let minutes: i32 = raw.get(3..5)?.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// HL7 TS to FHIR dateTime, keeping any fraction and offset
///
/// Missing month/day default to `01`, missing time parts to `00`.
pub fn ts_to_datetime(ts: &str) -> Result<String, ValueTransformError> {
    const NAME: &str = "ts_to_datetime";
    let trimmed = ts.trim();
    if trimmed.is_empty() {
        return Err(ValueTransformError::EmptyInput { transform: NAME });
    }
    let invalid = || ValueTransformError::InvalidFormat {
        transform: NAME,
        value: ts.to_string(),
    };
    let caps = timestamp_pattern().captures(trimmed).ok_or_else(invalid)?;
    let part = |name: &str, default: &'static str| {
        caps.name(name).map(|m| m.as_str()).unwrap_or(default).to_string()
    };

    let (year, month, day) = (part("Y", ""), part("M", "01"), part("D", "01"));
    let (hour, minute, second) = (part("h", "00"), part("m", "00"), part("s", "00"));
    let checked = NaiveDate::from_ymd_opt(
        year.parse().map_err(|_| invalid())?,
        month.parse().map_err(|_| invalid())?,
        day.parse().map_err(|_| invalid())?,
    )
    .and_then(|d| {
        d.and_hms_opt(
            hour.parse().ok()?,
            minute.parse().ok()?,
            second.parse().ok()?,
        )
    });
    if checked.is_none() {
        return Err(invalid());
    }

    let fraction = caps
        .name("frac")
        .map(|m| format!(".{}", m.as_str()))
        .unwrap_or_default();
    let zone = match caps.name("tz").map(|m| m.as_str()) {
        None => String::new(),
        Some("Z") => "Z".to_string(),
        Some(tz) => format!("{}:{}", &tz[..3], &tz[3..]),
    };
    Ok(format!(
        "{year}-{month}-{day}T{hour}:{minute}:{second}{fraction}{zone}"
    ))
}

/// PID-3 (repeating CX) to FHIR identifiers
///
/// Each repetition yields one identifier. The type coding comes from CX.5,
/// `MR` when absent. The system is `urn:oid:<oid>` when the assigning
/// authority (CX.4, `namespace&universal id&type`) is an ISO OID and
/// `urn:id:<namespace>` otherwise.
pub fn pid3_to_identifiers(cx: &str) -> Result<Vec<Identifier>, ValueTransformError> {
    const NAME: &str = "pid3_to_identifiers";
    if cx.trim().is_empty() {
        return Err(ValueTransformError::EmptyInput { transform: NAME });
    }

    let mut identifiers = Vec::new();
    for repetition in cx.split('~').filter(|r| !r.trim().is_empty()) {
        let comps: Vec<&str> = repetition.split('^').map(str::trim).collect();
        let value = comps[0];
        if value.is_empty() {
            return Err(ValueTransformError::InvalidFormat {
                transform: NAME,
                value: repetition.to_string(),
            });
        }
        let type_code = comps.get(4).copied().filter(|c| !c.is_empty()).unwrap_or("MR");
        let system = comps
            .get(3)
            .copied()
            .filter(|a| !a.is_empty())
            .and_then(authority_system);

        identifiers.push(Identifier {
            value: value.to_string(),
            system,
            identifier_type: CodeableConcept {
                coding: vec![Coding::new(IDENTIFIER_TYPE_SYSTEM, type_code)],
            },
        });
    }
    Ok(identifiers)
}

fn authority_system(authority: &str) -> Option<String> {
    let parts: Vec<&str> = authority.split('&').collect();
    if parts.len() >= 3 && !parts[1].is_empty() && parts[2].eq_ignore_ascii_case("ISO") {
        return Some(to_oid_uri(parts[1]));
    }
    if !parts[0].is_empty() {
        return Some(format!("urn:id:{}", parts[0]));
    }
    None
}

/// XPN to FHIR HumanName
///
/// Family comes from XPN.1, given names from XPN.2 and XPN.3 (middle).
/// Empty parts are left out.
pub fn name_family_given(xpn: &str) -> Result<HumanName, ValueTransformError> {
    const NAME: &str = "name_family_given";
    let first = xpn.split('~').next().unwrap_or("");
    let comps: Vec<&str> = first.split('^').map(str::trim).collect();

    let family = comps.first().copied().filter(|f| !f.is_empty()).map(String::from);
    let given: Vec<String> = comps
        .iter()
        .skip(1)
        .take(2)
        .filter(|g| !g.is_empty())
        .map(|g| g.to_string())
        .collect();

    if family.is_none() && given.is_empty() {
        return Err(ValueTransformError::EmptyInput { transform: NAME });
    }
    Ok(HumanName { family, given })
}

/// Administrative sex (table 0001) to FHIR gender
pub fn sex_to_gender(code: &str) -> &'static str {
    match code.trim().to_ascii_uppercase().as_str() {
        "M" => "male",
        "F" => "female",
        "O" => "other",
        _ => "unknown",
    }
}

/// Patient class (PV1-2) to an ActCode encounter class coding
pub fn pv1_class_to_code(code: &str) -> Coding {
    let mapped = match code.trim().to_ascii_uppercase().as_str() {
        "I" => "IMP",
        "O" | "R" => "AMB",
        "E" => "EMER",
        "B" => "OBSENC",
        _ => "UNK",
    };
    Coding::new(ACT_CODE_SYSTEM, mapped)
}

/// Numeric value with a UCUM unit
///
/// `code` defaults to `unit` when not given.
pub fn ucum_quantity(
    value: &str,
    unit: &str,
    code: Option<&str>,
) -> Result<Quantity, ValueTransformError> {
    let number: f64 = value
        .trim()
        .parse()
        .map_err(|_| ValueTransformError::InvalidNumber(value.to_string()))?;
    if !number.is_finite() {
        return Err(ValueTransformError::InvalidNumber(value.to_string()));
    }
    let unit = Some(unit.trim()).filter(|u| !u.is_empty());
    let code = code
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(String::from)
        .or_else(|| unit.map(String::from));

    Ok(Quantity {
        value: number,
        unit: unit.map(String::from),
        system: UCUM_SYSTEM.to_string(),
        code,
    })
}

fn normalize_code_system(system: &str) -> Option<String> {
    let trimmed = system.trim();
    match trimmed.to_ascii_uppercase().as_str() {
        "" => None,
        "LN" | "LOINC" => Some(LOINC_SYSTEM.to_string()),
        "SCT" | "SNOMED" => Some(SNOMED_SYSTEM.to_string()),
        _ => Some(trimmed.to_string()),
    }
}

/// CWE/CE (`code^display^system`) to CodeableConcept
pub fn cwe_to_codeable_concept(cwe: &str) -> CodeableConcept {
    let comps: Vec<&str> = cwe.split('^').map(str::trim).collect();
    let non_empty = |i: usize| comps.get(i).copied().filter(|c| !c.is_empty()).map(String::from);
    let coding = Coding {
        code: non_empty(0),
        display: non_empty(1),
        system: comps.get(2).and_then(|s| normalize_code_system(s)),
    };
    if coding == Coding::default() {
        return CodeableConcept::default();
    }
    CodeableConcept {
        coding: vec![coding],
    }
}

fn result_status(code: &str) -> &'static str {
    match code.trim().to_ascii_uppercase().as_str() {
        "F" => "final",
        "C" => "corrected",
        "P" => "preliminary",
        "R" => "registered",
        "X" => "cancelled",
        _ => "unknown",
    }
}

/// OBX-11 to Observation.status
pub fn obx_status_to_observation_status(code: &str) -> &'static str {
    if code.trim().eq_ignore_ascii_case("D") {
        return "entered-in-error";
    }
    result_status(code)
}

/// OBR-25 to DiagnosticReport.status
pub fn obr_status_to_report_status(code: &str) -> &'static str {
    result_status(code)
}

/// Observation.value[x] chosen from OBX-2 (value type), OBX-5 and OBX-6
///
/// `NM`/`SN` give `valueQuantity`, `CWE`/`CE` give `valueCodeableConcept`,
/// `DT`/`TS` give `valueDateTime` and anything else `valueString`.
pub fn obx_value_to_value_x(
    obx2: &str,
    obx5: &str,
    obx6: &str,
) -> Result<Value, ValueTransformError> {
    match obx2.trim().to_ascii_uppercase().as_str() {
        "NM" | "SN" => {
            // SN is comparator^number; NM is the bare number
            let number = match obx5.split_once('^') {
                Some((_, rest)) => rest.split('^').next().unwrap_or(""),
                None => obx5,
            };
            let mut units = obx6.split('^').map(str::trim);
            let unit_code = units.next().filter(|u| !u.is_empty());
            let unit_text = units.next().filter(|u| !u.is_empty());
            let quantity = ucum_quantity(
                number,
                unit_text.or(unit_code).unwrap_or(""),
                unit_code,
            )?;
            Ok(json!({ "valueQuantity": quantity }))
        }
        "CWE" | "CE" => Ok(json!({ "valueCodeableConcept": cwe_to_codeable_concept(obx5) })),
        "DT" | "TS" => Ok(json!({ "valueDateTime": ts_to_datetime(obx5)? })),
        _ => Ok(json!({ "valueString": obx5 })),
    }
}

/// Observation.category for laboratory results
pub fn observation_category_laboratory() -> CodeableConcept {
    CodeableConcept {
        coding: vec![Coding::new(OBSERVATION_CATEGORY_SYSTEM, "laboratory")],
    }
}

/// Prefix a bare OID with `urn:oid:`
pub fn to_oid_uri(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.starts_with("urn:oid:") {
        trimmed.to_string()
    } else {
        format!("urn:oid:{trimmed}")
    }
}

/// Transforms addressable by name from mapping rules
///
/// Most take one source value. `ucum_quantity` and `obx_value_to_value_x`
/// take two or three, `observation_category_laboratory` takes none.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueTransform {
    TsToDate,
    TsToInstant,
    TsToDatetime,
    Pid3ToIdentifiers,
    NameFamilyGiven,
    SexToGender,
    Pv1ClassToCode,
    CweToCodeableConcept,
    ObxStatusToObservationStatus,
    ObrStatusToReportStatus,
    ToOidUri,
    UcumQuantity,
    ObxValueToValueX,
    ObservationCategoryLaboratory,
}

impl FromStr for ValueTransform {
    type Err = ValueTransformError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let transform = match name.trim() {
            "ts_to_date" => Self::TsToDate,
            "ts_to_instant" => Self::TsToInstant,
            "ts_to_datetime" => Self::TsToDatetime,
            "pid3_to_identifiers" => Self::Pid3ToIdentifiers,
            "name_family_given" => Self::NameFamilyGiven,
            "sex_to_gender" => Self::SexToGender,
            "pv1_class_to_code" => Self::Pv1ClassToCode,
            "cwe_to_codeable_concept"
            | "obx_cwe_to_codeableconcept"
            | "spm_cwe_to_codeableconcept" => Self::CweToCodeableConcept,
            "obx_status_to_observation_status" | "obx_status_to_obs_status" => {
                Self::ObxStatusToObservationStatus
            }
            "obr_status_to_report_status" => Self::ObrStatusToReportStatus,
            "to_oid_uri" => Self::ToOidUri,
            "ucum_quantity" => Self::UcumQuantity,
            "obx_value_to_value_x" | "obx_value_to_valuex" => Self::ObxValueToValueX,
            "observation_category_laboratory" | "obs_category_laboratory" => {
                Self::ObservationCategoryLaboratory
            }
            other => return Err(ValueTransformError::UnknownTransform(other.to_string())),
        };
        Ok(transform)
    }
}

impl ValueTransform {
    /// Canonical rule name
    pub fn name(self) -> &'static str {
        match self {
            Self::TsToDate => "ts_to_date",
            Self::TsToInstant => "ts_to_instant",
            Self::TsToDatetime => "ts_to_datetime",
            Self::Pid3ToIdentifiers => "pid3_to_identifiers",
            Self::NameFamilyGiven => "name_family_given",
            Self::SexToGender => "sex_to_gender",
            Self::Pv1ClassToCode => "pv1_class_to_code",
            Self::CweToCodeableConcept => "cwe_to_codeable_concept",
            Self::ObxStatusToObservationStatus => "obx_status_to_observation_status",
            Self::ObrStatusToReportStatus => "obr_status_to_report_status",
            Self::ToOidUri => "to_oid_uri",
            Self::UcumQuantity => "ucum_quantity",
            Self::ObxValueToValueX => "obx_value_to_value_x",
            Self::ObservationCategoryLaboratory => "observation_category_laboratory",
        }
    }

    /// Number of source values accepted
    pub fn arity(self) -> RangeInclusive<usize> {
        match self {
            Self::ObservationCategoryLaboratory => 0..=0,
            Self::UcumQuantity | Self::ObxValueToValueX => 2..=3,
            _ => 1..=1,
        }
    }

    /// Reject a source value count outside [`arity`](Self::arity)
    pub fn check_arity(self, got: usize) -> Result<(), ValueTransformError> {
        let arity = self.arity();
        if arity.contains(&got) {
            return Ok(());
        }
        Err(ValueTransformError::Arity {
            transform: self.name(),
            min: *arity.start(),
            max: *arity.end(),
            got,
        })
    }

    /// Apply to a single raw HL7 value, producing JSON
    pub fn apply(self, input: &str) -> Result<Value, ValueTransformError> {
        self.apply_args(&[input])
    }

    /// Apply to source values in rule order
    pub fn apply_args(self, args: &[&str]) -> Result<Value, ValueTransformError> {
        self.check_arity(args.len())?;
        let value = match self {
            Self::TsToDate => Value::String(ts_to_date(args[0])?),
            Self::TsToInstant => Value::String(ts_to_instant(args[0])?),
            Self::TsToDatetime => Value::String(ts_to_datetime(args[0])?),
            Self::Pid3ToIdentifiers => json!(pid3_to_identifiers(args[0])?),
            Self::NameFamilyGiven => json!(name_family_given(args[0])?),
            Self::SexToGender => Value::String(sex_to_gender(args[0]).to_string()),
            Self::Pv1ClassToCode => json!(pv1_class_to_code(args[0])),
            Self::CweToCodeableConcept => json!(cwe_to_codeable_concept(args[0])),
            Self::ObxStatusToObservationStatus => {
                Value::String(obx_status_to_observation_status(args[0]).to_string())
            }
            Self::ObrStatusToReportStatus => {
                Value::String(obr_status_to_report_status(args[0]).to_string())
            }
            Self::ToOidUri => Value::String(to_oid_uri(args[0])),
            Self::UcumQuantity => json!(ucum_quantity(args[0], args[1], args.get(2).copied())?),
            Self::ObxValueToValueX => {
                obx_value_to_value_x(args[0], args[1], args.get(2).copied().unwrap_or(""))?
            }
            Self::ObservationCategoryLaboratory => json!(observation_category_laboratory()),
        };
        Ok(value)
    }
}

/// Look up a transform by rule name and apply it
///
/// # Errors
///
/// [`ValueTransformError::UnknownTransform`] for an unrecognized name, or the
/// transform's own error for malformed input.
pub fn apply_named(name: &str, input: &str) -> Result<Value, ValueTransformError> {
    name.parse::<ValueTransform>()?.apply(input)
}

/// Like [`apply_named`], for multi-value and constant rules
pub fn apply_named_args(name: &str, args: &[&str]) -> Result<Value, ValueTransformError> {
    name.parse::<ValueTransform>()?.apply_args(args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ts_to_date_precision() {
        assert_eq!(ts_to_date("20250130").unwrap(), "2025-01-30");
        assert_eq!(ts_to_date("20250130123045-0500").unwrap(), "2025-01-30");
        assert_eq!(ts_to_date("202501").unwrap(), "2025-01");
        assert_eq!(ts_to_date("2025013").unwrap(), "2025-01");
        assert_eq!(ts_to_date("2025").unwrap(), "2025");
    }

    #[test]
    fn test_ts_to_date_rejects() {
        assert_eq!(
            ts_to_date(""),
            Err(ValueTransformError::EmptyInput {
                transform: "ts_to_date"
            })
        );
        assert!(matches!(
            ts_to_date("202"),
            Err(ValueTransformError::InsufficientPrecision { required: 4, .. })
        ));
        assert!(ts_to_date("20251345").is_err());
        assert!(ts_to_date("202513").is_err());
        assert!(ts_to_date("2025ab").is_err());
    }

    #[test]
    fn test_ts_to_instant() {
        assert_eq!(
            ts_to_instant("20250130123045-0500").unwrap(),
            "2025-01-30T12:30:45-05:00"
        );
        assert_eq!(
            ts_to_instant("20250130123045").unwrap(),
            "2025-01-30T12:30:45Z"
        );
        assert_eq!(
            ts_to_instant("20250130123045.123+0130").unwrap(),
            "2025-01-30T12:30:45+01:30"
        );
    }

    #[test]
    fn test_ts_to_instant_rejects() {
        assert!(matches!(
            ts_to_instant("202501301230"),
            Err(ValueTransformError::InsufficientPrecision { required: 14, .. })
        ));
        assert!(ts_to_instant("20250130126045").is_err());
        assert!(ts_to_instant("20250130123045-05").is_err());
        assert!(ts_to_instant("20250130123045+2500").is_err());
    }

    #[test]
    fn test_ts_to_datetime() {
        assert_eq!(ts_to_datetime("2025").unwrap(), "2025-01-01T00:00:00");
        assert_eq!(
            ts_to_datetime("202501301230.5-0500").unwrap(),
            "2025-01-30T12:30:00.5-05:00"
        );
        assert!(ts_to_datetime("garbage").is_err());
        assert!(ts_to_datetime("20250230").is_err());
    }

    #[test]
    fn test_pid3_iso_authority() {
        let ids = pid3_to_identifiers("12345^^^HOSP&2.16.840.1.113883.19&ISO^MR").unwrap();
        assert_eq!(ids.len(), 1);
        assert_eq!(ids[0].value, "12345");
        assert_eq!(ids[0].system.as_deref(), Some("urn:oid:2.16.840.1.113883.19"));
        assert_eq!(
            ids[0].identifier_type.coding[0].system.as_deref(),
            Some(IDENTIFIER_TYPE_SYSTEM)
        );
    }

    #[test]
    fn test_pid3_named_authority_and_repeats() {
        let ids = pid3_to_identifiers("111^^^HOSP~222^^^^SS").unwrap();
        assert_eq!(ids.len(), 2);
        assert_eq!(ids[0].system.as_deref(), Some("urn:id:HOSP"));
        assert_eq!(ids[0].identifier_type.coding[0].code.as_deref(), Some("MR"));
        assert_eq!(ids[1].system, None);
        assert_eq!(ids[1].identifier_type.coding[0].code.as_deref(), Some("SS"));
    }

    #[test]
    fn test_pid3_rejects_missing_value() {
        assert!(pid3_to_identifiers("").is_err());
        assert!(pid3_to_identifiers("^^^HOSP").is_err());
    }

    #[test]
    fn test_identifier_json_shape() {
        let ids = pid3_to_identifiers("9^^^HOSP").unwrap();
        let value = serde_json::to_value(&ids[0]).unwrap();
        assert_eq!(value["value"], "9");
        assert_eq!(value["type"]["coding"][0]["code"], "MR");
    }

    #[test]
    fn test_name_family_given() {
        let name = name_family_given("DOE^JOHN^Q").unwrap();
        assert_eq!(name.family.as_deref(), Some("DOE"));
        assert_eq!(name.given, vec!["JOHN", "Q"]);

        let name = name_family_given("^JANE").unwrap();
        assert_eq!(name.family, None);
        assert_eq!(serde_json::to_value(&name).unwrap(), json!({"given": ["JANE"]}));

        assert!(name_family_given("^^").is_err());
    }

    #[test]
    fn test_sex_to_gender() {
        assert_eq!(sex_to_gender("M"), "male");
        assert_eq!(sex_to_gender("f"), "female");
        assert_eq!(sex_to_gender("O"), "other");
        assert_eq!(sex_to_gender("U"), "unknown");
        assert_eq!(sex_to_gender(""), "unknown");
    }

    #[test]
    fn test_pv1_class_to_code() {
        let expected = [
            ("I", "IMP"),
            ("O", "AMB"),
            ("E", "EMER"),
            ("R", "AMB"),
            ("B", "OBSENC"),
            ("Z", "UNK"),
            ("", "UNK"),
        ];
        for (input, code) in expected {
            let coding = pv1_class_to_code(input);
            assert_eq!(coding.code.as_deref(), Some(code), "{input}");
            assert_eq!(coding.system.as_deref(), Some(ACT_CODE_SYSTEM));
        }
    }

    #[test]
    fn test_ucum_quantity() {
        let q = ucum_quantity("72", "/min", None).unwrap();
        assert_eq!(q.value, 72.0);
        assert_eq!(q.code.as_deref(), Some("/min"));
        assert_eq!(q.system, UCUM_SYSTEM);

        let q = ucum_quantity("37.1", "degrees C", Some("Cel")).unwrap();
        assert_eq!(q.unit.as_deref(), Some("degrees C"));
        assert_eq!(q.code.as_deref(), Some("Cel"));

        assert!(matches!(
            ucum_quantity("high", "mg", None),
            Err(ValueTransformError::InvalidNumber(_))
        ));
        assert!(ucum_quantity("NaN", "mg", None).is_err());
    }

    #[test]
    fn test_cwe_to_codeable_concept() {
        let cc = cwe_to_codeable_concept("8867-4^Heart rate^LN");
        assert_eq!(cc.coding[0].system.as_deref(), Some(LOINC_SYSTEM));
        assert_eq!(cc.coding[0].display.as_deref(), Some("Heart rate"));
        assert!(cwe_to_codeable_concept("").coding.is_empty());
    }

    #[test]
    fn test_status_tables() {
        assert_eq!(obx_status_to_observation_status("D"), "entered-in-error");
        assert_eq!(obx_status_to_observation_status("f"), "final");
        assert_eq!(obr_status_to_report_status("D"), "unknown");
        assert_eq!(obr_status_to_report_status("C"), "corrected");
    }

    #[test]
    fn test_obx_value_to_value_x() {
        let v = obx_value_to_value_x("NM", "72", "/min^beats per minute").unwrap();
        assert_eq!(v["valueQuantity"]["value"], 72.0);
        assert_eq!(v["valueQuantity"]["unit"], "beats per minute");
        assert_eq!(v["valueQuantity"]["code"], "/min");

        let v = obx_value_to_value_x("SN", ">^100", "mg").unwrap();
        assert_eq!(v["valueQuantity"]["value"], 100.0);

        let v = obx_value_to_value_x("ST", "positive", "").unwrap();
        assert_eq!(v, json!({"valueString": "positive"}));

        let v = obx_value_to_value_x("TS", "20250130", "").unwrap();
        assert_eq!(v["valueDateTime"], "2025-01-30T00:00:00");
    }

    #[test]
    fn test_to_oid_uri() {
        assert_eq!(to_oid_uri("1.2.3"), "urn:oid:1.2.3");
        assert_eq!(to_oid_uri("urn:oid:1.2.3"), "urn:oid:1.2.3");
        assert_eq!(to_oid_uri(" "), "");
    }

    #[test]
    fn test_apply_named() {
        assert_eq!(apply_named("ts_to_date", "20250130").unwrap(), json!("2025-01-30"));
        assert_eq!(apply_named("sex_to_gender", "F").unwrap(), json!("female"));
        assert_eq!(
            apply_named("no_such_transform", "x"),
            Err(ValueTransformError::UnknownTransform(
                "no_such_transform".to_string()
            ))
        );
        assert!(apply_named("ts_to_instant", "2025").is_err());
    }

    #[test]
    fn test_apply_named_args_multi_value() {
        let q = apply_named_args("ucum_quantity", &["5.4", "mmol/L"]).unwrap();
        assert_eq!(
            q,
            json!({"value": 5.4, "unit": "mmol/L", "system": UCUM_SYSTEM, "code": "mmol/L"})
        );

        let v = apply_named_args("obx_value_to_valuex", &["NM", "72", "/min"]).unwrap();
        assert_eq!(v["valueQuantity"]["code"], "/min");

        let v = apply_named_args("obx_value_to_value_x", &["ST", "negative"]).unwrap();
        assert_eq!(v, json!({"valueString": "negative"}));
    }

    #[test]
    fn test_apply_named_args_constant() {
        let v = apply_named_args("obs_category_laboratory", &[]).unwrap();
        assert_eq!(v["coding"][0]["code"], "laboratory");
        assert_eq!(v["coding"][0]["system"], OBSERVATION_CATEGORY_SYSTEM);
    }

    #[test]
    fn test_apply_named_args_wrong_count() {
        assert_eq!(
            apply_named_args("ts_to_date", &["20250130", "x"]),
            Err(ValueTransformError::Arity {
                transform: "ts_to_date",
                min: 1,
                max: 1,
                got: 2
            })
        );
        assert!(matches!(
            apply_named_args("ucum_quantity", &["5"]),
            Err(ValueTransformError::Arity { min: 2, max: 3, .. })
        ));
        assert!(apply_named("observation_category_laboratory", "x").is_err());
    }

    #[test]
    fn test_transform_aliases() {
        let spm = apply_named("spm_cwe_to_codeableconcept", "119297000^Blood^SCT").unwrap();
        assert_eq!(spm["coding"][0]["system"], SNOMED_SYSTEM);
        assert_eq!(
            "obs_category_laboratory".parse::<ValueTransform>().unwrap().name(),
            "observation_category_laboratory"
        );
        assert_eq!(
            "obx_status_to_obs_status".parse::<ValueTransform>(),
            Ok(ValueTransform::ObxStatusToObservationStatus)
        );
    }

    #[test]
    fn test_datatype_json_omits_absent_parts() {
        let q = ucum_quantity("3", "", None).unwrap();
        assert_eq!(serde_json::to_value(&q).unwrap(), json!({"value": 3.0, "system": UCUM_SYSTEM}));

        let cc = cwe_to_codeable_concept("1234-5");
        assert_eq!(serde_json::to_value(&cc).unwrap(), json!({"coding": [{"code": "1234-5"}]}));
    }
}
