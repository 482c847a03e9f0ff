#[path = "common/mod.rs"]
mod common;

use common::*;
use dumpsift::{
    is_truthy, is_valid_community_name, normalize_community, project, project_post, CommunityTargets,
    NormalizedPost, DELETED_AUTHOR, KEEP_FIELDS,
};
use serde_json::{json, Value};

/// Projection keeps exactly the allow-listed keys: extras are dropped and
/// absent fields come back as `null`.
#[test]
fn projection_has_exactly_the_keep_fields() {
    let mut raw = raw_post("p1", "math", true, 1_700_000_000);
    let obj = raw.as_object_mut().unwrap();
    obj.remove("distinguished");
    obj.remove("upvote_ratio");

    let projected = project_post(obj);
    assert_eq!(projected.len(), KEEP_FIELDS.len());
    for k in KEEP_FIELDS {
        assert!(projected.contains_key(k), "missing {k}");
    }
    assert!(!projected.contains_key("domain"));
    assert!(!projected.contains_key("retrieved_on"));
    assert_eq!(projected["distinguished"], Value::Null);
    assert_eq!(projected["upvote_ratio"], Value::Null);
    assert_eq!(projected["id"], json!("p1"));
}

/// A caller-supplied field list works the same way.
#[test]
fn projection_with_custom_fields() {
    let raw = raw_post("p2", "math", true, 5);
    let projected = project(raw.as_object().unwrap(), &["id", "nope"]);
    assert_eq!(projected.len(), 2);
    assert_eq!(projected["id"], json!("p2"));
    assert_eq!(projected["nope"], Value::Null);
}

/// Decoding is lenient: numbers as strings, missing author, numeric flags.
#[test]
fn normalized_post_decodes_leniently() {
    let raw = json!({
        "id": "x1",
        "created_utc": "1700000000",
        "score": 7.0,
        "num_comments": null,
        "is_self": 1,
        "over_18": "",
        "author": "",
        "subreddit": "Math",
    });
    let p = NormalizedPost::from_raw(raw.as_object().unwrap()).unwrap();
    assert_eq!(p.id, "x1");
    assert_eq!(p.created_utc, 1_700_000_000);
    assert_eq!(p.score, 7);
    assert_eq!(p.num_comments, 0);
    assert!(p.is_self);
    assert!(!p.over_18);
    assert_eq!(p.author, DELETED_AUTHOR);
    assert_eq!(p.subreddit, "Math");
    assert_eq!(p.distinguished, None);
}

/// A serialized post reads back unchanged, and `text_len` counts title + body.
#[test]
fn normalized_post_line_round_trip() {
    let p = NormalizedPost::from_line(&raw_line("r1", "math", true, 42)).unwrap();
    let line = serde_json::to_string(&p).unwrap();
    let back = NormalizedPost::from_line(&line).unwrap();
    assert_eq!(p, back);
    assert_eq!(p.text_len(), "title r1".len() + "body of r1".len());
}

/// Truthiness follows loose flag encodings.
#[test]
fn truthiness_rules() {
    assert!(is_truthy(&json!(true)));
    assert!(is_truthy(&json!(1)));
    assert!(is_truthy(&json!("yes")));
    assert!(is_truthy(&json!([0])));
    assert!(!is_truthy(&json!(false)));
    assert!(!is_truthy(&json!(0)));
    assert!(!is_truthy(&json!(0.0)));
    assert!(!is_truthy(&json!("")));
    assert!(!is_truthy(&json!({})));
    assert!(!is_truthy(&Value::Null));
}

/// Target membership ignores case and a leading `r/`; invalid names are dropped.
#[test]
fn community_targets_are_case_insensitive() {
    assert_eq!(normalize_community("  r/AskReddit "), "askreddit");

    let t = CommunityTargets::new(["AskReddit", "r/Math", ""]);
    assert_eq!(t.len(), 2);
    assert!(t.contains("askreddit"));
    assert!(t.contains("ASKREDDIT"));
    assert!(t.contains("math"));
    assert!(!t.contains("rust"));
    assert_eq!(t.sorted(), vec!["askreddit".to_string(), "math".to_string()]);

    assert!(is_valid_community_name("RedditForGrownups"));
    assert!(is_valid_community_name("r/self_improvement"));
    assert!(!is_valid_community_name("has space"));
    assert!(!is_valid_community_name("waytoolongcommunityname_x"));

    let v = CommunityTargets::validated(["math", "bad name!", "r/Anxiety"]);
    assert_eq!(v.sorted(), vec!["anxiety".to_string(), "math".to_string()]);
}
