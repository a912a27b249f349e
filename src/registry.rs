//! Session registry view: one `docker ps` label query, parsed into records.
//!
//! The running container set is the only session database. Every call asks
//! the engine afresh; nothing here caches across invocations.

use serde::Serialize;

use crate::docker::Docker;

/// Label keys written at start and read back here.
pub const LABEL_PREFIX: &str = "com.simdock";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionRecord {
    pub id: String,
    pub name: String,
    pub session_id: String,
    pub nickname: String,
    pub profile: String,
    pub gui: String,
    pub access: String,
}

fn ps_format() -> String {
    format!(
        "{{{{.ID}}}}\t{{{{.Names}}}}\t{{{{.Label \"{p}.session_id\"}}}}\t\
         {{{{.Label \"{p}.nickname\"}}}}\t{{{{.Label \"{p}.profile\"}}}}\t\
         {{{{.Label \"{p}.gui\"}}}}\t{{{{.Label \"{p}.access\"}}}}",
        p = LABEL_PREFIX
    )
}

/// Snapshot of running sessions. Query failure yields an empty list: callers
/// must treat empty as "no information", never raise from here.
pub fn list_sessions(docker: &Docker) -> Vec<SessionRecord> {
    let args = vec![
        "ps".to_string(),
        "--filter".to_string(),
        format!("name=^/{}", crate::CONTAINER_PREFIX),
        "--format".to_string(),
        ps_format(),
    ];
    match docker.capture_stdout(&args) {
        Some(out) => parse_ps_output(&out),
        None => Vec::new(),
    }
}

pub fn parse_ps_output(out: &str) -> Vec<SessionRecord> {
    out.lines().filter_map(parse_row).collect()
}

fn infer_gui(profile: &str) -> &'static str {
    if profile.contains("webrtc") {
        "webrtc"
    } else {
        "none"
    }
}

fn infer_access(profile: &str) -> &'static str {
    if profile.ends_with("-remote") {
        "remote"
    } else if profile.contains("webrtc") {
        "local"
    } else {
        "unknown"
    }
}

/// One tab-separated `docker ps` line. Seven fields map positionally; five
/// fields is a pre-label session whose gui/access get inferred from the
/// profile string; anything shorter is discarded.
fn parse_row(line: &str) -> Option<SessionRecord> {
    let parts: Vec<&str> = line.split('\t').collect();
    let (id, name, session_id, nickname, profile, gui, access) = if parts.len() >= 7 {
        (
            parts[0], parts[1], parts[2], parts[3], parts[4], parts[5], parts[6],
        )
    } else if parts.len() >= 5 {
        (parts[0], parts[1], parts[2], parts[3], parts[4], "", "")
    } else {
        return None;
    };
    // An empty label value falls back to the same inference as a missing one.
    let gui = if gui.is_empty() { infer_gui(profile) } else { gui };
    let access = if access.is_empty() {
        infer_access(profile)
    } else {
        access
    };
    Some(SessionRecord {
        id: id.to_string(),
        name: name.to_string(),
        session_id: session_id.to_string(),
        nickname: nickname.to_string(),
        profile: profile.to_string(),
        gui: gui.to_string(),
        access: access.to_string(),
    })
}

/// First record matching by container name or session id, in engine listing
/// order (which is unspecified and must not be assumed stable).
pub fn find<'a>(
    records: &'a [SessionRecord],
    name: Option<&str>,
    session_id: Option<&str>,
) -> Option<&'a SessionRecord> {
    records.iter().find(|r| {
        name.map(|n| r.name == n).unwrap_or(false)
            || session_id.map(|s| r.session_id == s).unwrap_or(false)
    })
}

/// Case-insensitive filters; "all" or empty means identity for gui/access,
/// empty means identity for the nickname substring.
pub fn filter_records(
    records: &[SessionRecord],
    gui: &str,
    access: &str,
    nickname: &str,
) -> Vec<SessionRecord> {
    let nickname = nickname.to_lowercase();
    records
        .iter()
        .filter(|r| passes(&r.gui, gui))
        .filter(|r| passes(&r.access, access))
        .filter(|r| nickname.is_empty() || r.nickname.to_lowercase().contains(&nickname))
        .cloned()
        .collect()
}

fn passes(value: &str, wanted: &str) -> bool {
    wanted.is_empty() || wanted.eq_ignore_ascii_case("all") || value.eq_ignore_ascii_case(wanted)
}

/// The record blocking a new local GUI session, if any: an active x11
/// session or a local WebRTC session.
pub fn local_gui_blocker(records: &[SessionRecord]) -> Option<&SessionRecord> {
    records.iter().find(|r| {
        r.gui.eq_ignore_ascii_case("x11")
            || (r.gui.eq_ignore_ascii_case("webrtc") && r.access.eq_ignore_ascii_case("local"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(gui: &str, access: &str, nickname: &str) -> SessionRecord {
        SessionRecord {
            id: "abc123".to_string(),
            name: "simdock-base".to_string(),
            session_id: "123-00001".to_string(),
            nickname: nickname.to_string(),
            profile: "base".to_string(),
            gui: gui.to_string(),
            access: access.to_string(),
        }
    }

    #[test]
    fn test_full_row_maps_positionally() {
        let line =
            "deadbeef\tsimdock-webrtc-local\t17123-00042\tswift otter\twebrtc-local\twebrtc\tlocal";
        let r = parse_row(line).unwrap();
        assert_eq!(r.id, "deadbeef");
        assert_eq!(r.name, "simdock-webrtc-local");
        assert_eq!(r.session_id, "17123-00042");
        assert_eq!(r.nickname, "swift otter");
        assert_eq!(r.profile, "webrtc-local");
        assert_eq!(r.gui, "webrtc");
        assert_eq!(r.access, "local");
    }

    #[test]
    fn test_legacy_row_inference() {
        let r = parse_row("id\tsimdock-x\tsid\tnick\twebrtc-remote").unwrap();
        assert_eq!(r.gui, "webrtc");
        assert_eq!(r.access, "remote");

        let r = parse_row("id\tsimdock-x\tsid\tnick\tros2-webrtc-local").unwrap();
        assert_eq!(r.gui, "webrtc");
        assert_eq!(r.access, "local");

        let r = parse_row("id\tsimdock-x\tsid\tnick\tbase").unwrap();
        assert_eq!(r.gui, "none");
        assert_eq!(r.access, "unknown");
    }

    #[test]
    fn test_empty_label_values_fall_back_to_inference() {
        let r = parse_row("id\tsimdock-x\tsid\tnick\twebrtc-local\t\t").unwrap();
        assert_eq!(r.gui, "webrtc");
        assert_eq!(r.access, "local");
    }

    #[test]
    fn test_short_rows_are_discarded() {
        assert!(parse_row("id\tname\tsid").is_none());
        assert!(parse_row("").is_none());
        let records = parse_ps_output("id\tname\tsid\n\nid\tn\tsid\tnick\tbase\n");
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_filter_identity_with_all_or_empty() {
        let records = vec![
            rec("webrtc", "local", "swift otter"),
            rec("x11", "local", "calm fox"),
        ];
        assert_eq!(filter_records(&records, "all", "all", "").len(), 2);
        assert_eq!(filter_records(&records, "", "", "").len(), 2);
    }

    #[test]
    fn test_filter_gui_case_insensitive() {
        let records = vec![
            rec("WebRTC", "local", "a"),
            rec("x11", "local", "b"),
            rec("none", "unknown", "c"),
        ];
        let got = filter_records(&records, "x11", "all", "");
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].nickname, "b");
        let got = filter_records(&records, "webrtc", "all", "");
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].nickname, "a");
    }

    #[test]
    fn test_filter_nickname_substring() {
        let records = vec![
            rec("none", "unknown", "Swift Otter"),
            rec("none", "unknown", "calm fox"),
        ];
        let got = filter_records(&records, "all", "all", "otter");
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].nickname, "Swift Otter");
    }

    #[test]
    fn test_find_by_name_or_session_id() {
        let records = vec![rec("none", "unknown", "a"), {
            let mut r = rec("none", "unknown", "b");
            r.name = "simdock-ros2".to_string();
            r.session_id = "999-00009".to_string();
            r
        }];
        assert!(find(&records, Some("simdock-ros2"), None).is_some());
        assert!(find(&records, None, Some("999-00009")).is_some());
        assert!(find(&records, Some("nope"), Some("nope")).is_none());
        assert!(find(&records, None, None).is_none());
    }

    #[test]
    fn test_local_gui_blocker() {
        let none = vec![rec("none", "unknown", "a"), rec("webrtc", "remote", "b")];
        assert!(local_gui_blocker(&none).is_none());

        let x11 = vec![rec("x11", "local", "a")];
        assert_eq!(local_gui_blocker(&x11).unwrap().nickname, "a");

        let webrtc_local = vec![rec("webrtc", "local", "c")];
        assert!(local_gui_blocker(&webrtc_local).is_some());
    }
}
