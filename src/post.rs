//! The normalized post record, the field allow-list, projection, and community targets.

use crate::json_utils::{
    lenient_author, lenient_bool, lenient_f64, lenient_i64, lenient_opt_string, lenient_string,
};
use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Author sentinel used when a record carries no author.
pub const DELETED_AUTHOR: &str = "[deleted]";

/// Closed field set projected from every accepted record.
pub const KEEP_FIELDS: [&str; 18] = [
    "id",
    "created_utc",
    "title",
    "author",
    "num_comments",
    "score",
    "permalink",
    "url",
    "selftext",
    "subreddit",
    "upvote_ratio",
    "over_18",
    "spoiler",
    "locked",
    "archived",
    "distinguished",
    "stickied",
    "is_self",
];

/// Reduce `raw` to exactly `keep_fields`. Missing fields map to `null`.
pub fn project<S: AsRef<str>>(raw: &Map<String, Value>, keep_fields: &[S]) -> Map<String, Value> {
    let mut out = Map::new();
    for k in keep_fields {
        let k = k.as_ref();
        out.insert(k.to_string(), raw.get(k).cloned().unwrap_or(Value::Null));
    }
    out
}

/// Projection with the standard allow-list.
#[inline]
pub fn project_post(raw: &Map<String, Value>) -> Map<String, Value> {
    project(raw, &KEEP_FIELDS)
}

fn deleted_author() -> String {
    DELETED_AUTHOR.to_string()
}

/// One self post, normalized. Decoding is lenient: absent or mistyped fields
/// fall back to zero values instead of failing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPost {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub created_utc: i64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub selftext: String,
    #[serde(default = "deleted_author", deserialize_with = "lenient_author")]
    pub author: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub subreddit: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub url: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub permalink: String,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub score: i64,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub num_comments: i64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub upvote_ratio: f64,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub over_18: bool,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub spoiler: bool,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub locked: bool,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub archived: bool,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub stickied: bool,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_self: bool,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub distinguished: Option<String>,
}

impl NormalizedPost {
    /// Project `raw` onto the allow-list and decode it.
    pub fn from_raw(raw: &Map<String, Value>) -> serde_json::Result<Self> {
        serde_json::from_value(Value::Object(project_post(raw)))
    }

    /// Decode a single JSON line (a raw record or an already projected one).
    pub fn from_line(line: &str) -> serde_json::Result<Self> {
        match serde_json::from_str::<Value>(line)? {
            Value::Object(map) => Self::from_raw(&map),
            _ => Err(serde::de::Error::custom("expected a JSON object")),
        }
    }

    /// Combined title + body length, used by the text-length criterion.
    pub fn text_len(&self) -> usize {
        self.title.chars().count() + self.selftext.chars().count()
    }
}

/// Normalize a community name: trim, lower-case, drop a leading `r/`.
#[inline]
pub fn normalize_community(s: &str) -> String {
    let s = s.trim().to_lowercase();
    if let Some(rest) = s.strip_prefix("r/") { rest.to_string() } else { s }
}

/// 1..=21 characters, ASCII alphanumerics or underscore, optional `r/` prefix.
pub fn is_valid_community_name(name: &str) -> bool {
    let name = name.strip_prefix("r/").unwrap_or(name);
    if name.is_empty() || name.len() > 21 {
        return false;
    }
    name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Case-insensitive community membership set.
#[derive(Clone, Debug, Default)]
pub struct CommunityTargets {
    names: AHashSet<String>,
}

impl CommunityTargets {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names = names
            .into_iter()
            .map(|s| normalize_community(s.as_ref()))
            .filter(|s| !s.is_empty())
            .collect();
        Self { names }
    }

    /// Like `new`, but drops (and logs) names that cannot be community names.
    pub fn validated<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let kept: Vec<String> = names
            .into_iter()
            .filter_map(|s| {
                let s = s.as_ref().trim();
                if is_valid_community_name(s) {
                    Some(s.to_string())
                } else {
                    tracing::warn!("ignoring invalid community name {:?}", s);
                    None
                }
            })
            .collect();
        Self::new(kept)
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        if name.chars().any(char::is_uppercase) {
            self.contains_lower(&name.to_lowercase())
        } else {
            self.contains_lower(name)
        }
    }

    /// Membership check for a name that is already lower-cased.
    #[inline]
    pub fn contains_lower(&self, lower: &str) -> bool {
        self.names.contains(lower)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Sorted names, for logging.
    pub fn sorted(&self) -> Vec<String> {
        let mut v: Vec<String> = self.names.iter().cloned().collect();
        v.sort();
        v
    }
}
