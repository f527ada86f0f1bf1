use serde::{Deserialize, Deserializer};

// html selects post their values as strings, scripts post numbers
#[derive(Deserialize)]
#[serde(untagged)]
enum IntOrString {
    Int(i64),
    Str(String),
}

/// An `i64` that may arrive either as a JSON number or as a numeric string.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(try_from = "IntOrString")]
pub struct LooseI64(pub i64);

impl TryFrom<IntOrString> for LooseI64 {
    type Error = String;

    fn try_from(value: IntOrString) -> Result<Self, Self::Error> {
        match value {
            IntOrString::Int(v) => Ok(LooseI64(v)),
            IntOrString::Str(s) => match s.trim().parse::<i64>() {
                Ok(v) => Ok(LooseI64(v)),
                Err(_) => Err(format!("Wrong value {s}, can not parse to i64")),
            },
        }
    }
}

// query strings with a garbage number behave as if the parameter was not sent
pub fn deserialize_lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.trim().parse().ok()))
}
