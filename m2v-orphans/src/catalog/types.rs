//! Wire types for the MythTV services API
//!
//! MythTV serializes most scalars as JSON strings ("1008", "true"), but some
//! builds emit bare numbers and booleans. Every scalar here accepts both.

use serde::{Deserialize, Deserializer};

/// `Myth/GetStorageGroupDirs` response
#[derive(Debug, Clone, Deserialize)]
pub struct StorageGroupDirsResponse {
    #[serde(rename = "StorageGroupDirList")]
    pub list: StorageGroupDirList,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageGroupDirList {
    #[serde(rename = "StorageGroupDirs", default)]
    pub dirs: Vec<StorageGroupDir>,
}

/// One (group, host) → directory entry
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StorageGroupDir {
    #[serde(rename = "GroupName")]
    pub group_name: String,
    #[serde(rename = "HostName")]
    pub host_name: String,
    #[serde(rename = "DirName")]
    pub dir_name: String,
}

/// `Channel/GetChannelInfo` response
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelInfoResponse {
    #[serde(rename = "ChannelInfo")]
    pub channel: ChannelInfo,
}

/// Channel metadata
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChannelInfo {
    #[serde(rename = "ChanId", deserialize_with = "string_or_number")]
    pub chan_id: String,
    /// Display number ("8", "8_1", "8.1")
    #[serde(rename = "ChanNum", deserialize_with = "string_or_number", default)]
    pub chan_num: String,
    #[serde(rename = "CallSign", default)]
    pub call_sign: String,
    #[serde(rename = "ChannelName", default)]
    pub channel_name: String,
}

impl ChannelInfo {
    /// Leading digits of the display number, 0 if there are none
    pub fn numeric_channel(&self) -> i64 {
        let digits: String = self
            .chan_num
            .trim()
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        digits.parse().unwrap_or(0)
    }
}

/// `Dvr/GetRecordedList` response
#[derive(Debug, Clone, Deserialize)]
pub struct RecordedListResponse {
    #[serde(rename = "ProgramList")]
    pub list: ProgramList,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProgramList {
    #[serde(rename = "Programs", default)]
    pub programs: Vec<RecordingDescriptor>,
}

/// A recording the backend knows about
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RecordingDescriptor {
    #[serde(rename = "FileName")]
    pub file_name: String,
    #[serde(rename = "HostName", default)]
    pub host_name: String,
    #[serde(rename = "Title", default)]
    pub title: String,
    #[serde(rename = "SubTitle", default)]
    pub sub_title: String,
    #[serde(rename = "StartTime", default)]
    pub start_time: String,
}

/// `{"bool": "true"}` style acknowledgement
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct BoolResponse {
    #[serde(rename = "bool", deserialize_with = "string_or_bool")]
    pub value: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Scalar::deserialize(deserializer)? {
        Scalar::Str(s) => s,
        Scalar::Int(n) => n.to_string(),
        Scalar::Float(f) => f.to_string(),
        Scalar::Bool(b) => b.to_string(),
    })
}

fn string_or_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Scalar::deserialize(deserializer)? {
        Scalar::Bool(b) => Ok(b),
        Scalar::Str(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" | "" => Ok(false),
            other => Err(serde::de::Error::custom(format!(
                "invalid boolean string: {}",
                other
            ))),
        },
        Scalar::Int(n) => Ok(n != 0),
        Scalar::Float(f) => Ok(f != 0.0),
    }
}
