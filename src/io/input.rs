use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;
use tracing::debug;

use crate::models::{Message, ParseStats, Speaker, Transcript};
use crate::text::fold_key;

/// `<date>[,] <time> - <rest>`, e.g. `09/11/2025, 15:59 - Ana: oi`
static HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2}[/.\-]\d{1,2}[/.\-]\d{2,4}),?\s+(\d{1,2}:\d{2})\s*-\s*(.+)$")
        .expect("header pattern is valid")
});

/// Notices that appear at the very start of a line
const NOTICE_PREFIXES: &[&str] = &[
    "WhatsApp Business",
    "Os envios de mídia",
    "Mensagens e chamadas",
    "Messages and calls",
];

/// Encryption notices, recognised anywhere in a line
const NOTICE_FRAGMENTS: &[&str] = &[
    "As mensagens e ligações são protegidas",
    "As mensagens e chamadas são protegidas",
    "As mensagens enviadas a este grupo agora estão protegidas",
    "Messages and calls are end-to-end encrypted",
    "Messages to this group are now secured with end-to-end encryption",
];

/// Group events. Only checked in the author position of a header, since the
/// event text itself may contain a colon (`X changed the subject from "a: b"`)
const GROUP_EVENT_FRAGMENTS: &[&str] = &[
    "joined using this group's invite link",
    "entrou usando o link de convite",
    "changed the subject from",
    "mudou o assunto de",
    "changed this group's icon",
    "mudou a imagem deste grupo",
];

/// Characters some exporters put in front of lines
const INVISIBLE_MARKS: &[char] = &['\u{feff}', '\u{200e}', '\u{200f}'];

/// Read an export from disk and parse it
pub fn parse_export_file(path: &Path, self_hint: &str) -> Result<Transcript> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {:?}", path))?;
    Ok(parse_export(&content, self_hint))
}

/// Parse a raw chat export into a speaker-attributed transcript.
///
/// Lines are classified one at a time as blank, system notice, message
/// header, or continuation. A header opens a new message; a continuation is
/// appended to the open message with a single space. If nothing parses, the
/// whole export becomes one [`Speaker::Other`] message so later stages always
/// have something to work with.
pub fn parse_export(raw: &str, self_hint: &str) -> Transcript {
    let normalized = raw.replace("\r\n", "\n");
    let hint_key = fold_key(self_hint);

    let mut messages = Vec::new();
    let mut stats = ParseStats::default();
    let mut current: Option<Message> = None;

    for raw_line in normalized.split('\n') {
        match classify_line(raw_line) {
            LineKind::Blank => {}
            LineKind::Notice => stats.system_notices += 1,
            LineKind::HeaderNotice => {
                // the notice's own wrapped lines must not leak into the previous message
                messages.extend(current.take());
                stats.system_notices += 1;
            }
            LineKind::Header {
                timestamp,
                author,
                body,
            } => {
                messages.extend(current.take());
                stats.header_lines += 1;
                let speaker = resolve_speaker(author, &hint_key);
                current = Some(Message::new(speaker, body).with_timestamp(timestamp));
            }
            LineKind::Continuation(line) => match current.as_mut() {
                Some(message) => {
                    message.text.push(' ');
                    message.text.push_str(line);
                    stats.continuation_lines += 1;
                }
                None => stats.orphan_lines += 1,
            },
        }
    }
    messages.extend(current);

    if messages.is_empty() {
        debug!("No message headers recognised, using raw text as a single message");
        stats.fallback = true;
        messages.push(Message::new(Speaker::Other, raw));
    }

    debug!(
        "Parsed {} messages ({} headers, {} continuations, {} notices, {} orphans)",
        messages.len(),
        stats.header_lines,
        stats.continuation_lines,
        stats.system_notices,
        stats.orphan_lines
    );

    Transcript {
        messages,
        raw_text: raw.to_string(),
        self_hint: self_hint.to_string(),
        stats,
    }
}

#[derive(Debug, PartialEq, Eq)]
enum LineKind<'a> {
    Blank,
    Notice,
    HeaderNotice,
    Header {
        timestamp: String,
        author: &'a str,
        body: &'a str,
    },
    Continuation(&'a str),
}

fn classify_line(raw_line: &str) -> LineKind<'_> {
    let line = raw_line.trim().trim_matches(INVISIBLE_MARKS).trim();
    if line.is_empty() {
        return LineKind::Blank;
    }

    if is_system_notice(line) {
        return LineKind::Notice;
    }

    let Some(caps) = HEADER_RE.captures(line) else {
        return LineKind::Continuation(line);
    };
    let (Some(date), Some(time), Some(rest)) = (caps.get(1), caps.get(2), caps.get(3)) else {
        return LineKind::Continuation(line);
    };
    let rest = rest.as_str();

    match rest.split_once(':') {
        Some((author, _)) if is_group_event(author) => LineKind::HeaderNotice,
        Some((author, body)) => LineKind::Header {
            timestamp: format!("{} {}", date.as_str(), time.as_str()),
            author: author.trim().trim_matches(INVISIBLE_MARKS),
            body: body.trim(),
        },
        // "X joined the group", "You created group ..."
        None => LineKind::HeaderNotice,
    }
}

fn is_system_notice(line: &str) -> bool {
    NOTICE_PREFIXES.iter().any(|p| line.starts_with(p))
        || NOTICE_FRAGMENTS.iter().any(|f| line.contains(f))
}

fn is_group_event(author: &str) -> bool {
    GROUP_EVENT_FRAGMENTS.iter().any(|f| author.contains(f))
}

fn resolve_speaker(author: &str, hint_key: &str) -> Speaker {
    if !hint_key.is_empty() && fold_key(author) == hint_key {
        Speaker::SelfParty
    } else {
        Speaker::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SpeakerLabels;

    #[test]
    fn test_parse_export_basic() {
        let raw = "09/11/2025 15:59 - Ana: Oi, tudo bem?\n\
                   09/11/2025, 16:01 - Cliente Bruno: Tudo! Quanto custa o curso?\n\
                   09/11/2025 16:02 - Ana: R$ 497 à vista";

        let transcript = parse_export(raw, "Ana");

        assert_eq!(transcript.messages.len(), 3);
        assert_eq!(transcript.messages[0].speaker, Speaker::SelfParty);
        assert_eq!(transcript.messages[1].speaker, Speaker::Other);
        assert_eq!(transcript.messages[1].text, "Tudo! Quanto custa o curso?");
        assert_eq!(
            transcript.messages[1].timestamp.as_deref(),
            Some("09/11/2025 16:01")
        );
        assert_eq!(transcript.stats.header_lines, 3);
        assert!(!transcript.stats.fallback);
    }

    #[test]
    fn test_message_count_equals_header_count() {
        let raw = (0..25)
            .map(|i| format!("1/2/24 9:{:02} - Person {}: message {}", i, i % 3, i))
            .collect::<Vec<_>>()
            .join("\n");

        let transcript = parse_export(&raw, "Person 1");
        assert_eq!(transcript.messages.len(), 25);
        assert_eq!(transcript.stats.header_lines, 25);
    }

    #[test]
    fn test_continuation_lines_join_with_space() {
        let raw = "09/11/2025 15:59 - Bruno: primeira linha\r\nsegunda linha\r\n\r\n   terceira   \r\n09/11/2025 16:00 - Ana: ok";

        let transcript = parse_export(raw, "Ana");

        assert_eq!(transcript.messages.len(), 2);
        assert_eq!(
            transcript.messages[0].text,
            "primeira linha segunda linha terceira"
        );
        assert_eq!(transcript.stats.continuation_lines, 2);
    }

    #[test]
    fn test_speaker_resolution_ignores_case_and_diacritics() {
        for author in ["João", "joao", "JOAO", "João "] {
            let raw = format!("09/11/2025 15:59 - {}: oi", author);
            let transcript = parse_export(&raw, "Joao");
            assert_eq!(transcript.messages[0].speaker, Speaker::SelfParty, "{author}");
        }

        let transcript = parse_export("09/11/2025 15:59 - Maria: oi", "João");
        assert_eq!(transcript.messages[0].speaker, Speaker::Other);
    }

    #[test]
    fn test_empty_hint_never_matches() {
        let transcript = parse_export("09/11/2025 15:59 - 🙂: oi", "");
        assert_eq!(transcript.messages[0].speaker, Speaker::Other);
    }

    #[test]
    fn test_system_notices_are_dropped() {
        let raw = "09/11/2025 15:58 - As mensagens e ligações são protegidas com a criptografia de ponta a ponta. Ninguém fora da conversa pode ler.\n\
                   Messages and calls are end-to-end encrypted. No one outside of this chat can read them.\n\
                   09/11/2025 15:59 - Bruno: oi\n\
                   09/11/2025 16:00 - Carla joined using this group's invite link\n\
                   09/11/2025 16:00 - Ana added Carla\n\
                   09/11/2025 16:01 - Ana: bem-vinda";

        let transcript = parse_export(raw, "Ana");

        assert_eq!(transcript.messages.len(), 2);
        assert_eq!(transcript.messages[0].text, "oi");
        assert_eq!(transcript.messages[1].text, "bem-vinda");
        assert_eq!(transcript.stats.system_notices, 4);
        assert!(
            transcript
                .messages
                .iter()
                .all(|m| !m.text.contains("criptografia") && !m.text.contains("encrypted"))
        );
    }

    #[test]
    fn test_group_event_wording_inside_a_message_is_kept() {
        let raw = "09/11/2025 15:59 - Bruno: Meu chefe mudou o assunto de novo, mas quero fechar hoje\n\
                   09/11/2025 16:00 - Ana: combinado\n\
                   09/11/2025 16:01 - Bruno: he changed the subject from price to dates";

        let transcript = parse_export(raw, "Ana");

        assert_eq!(transcript.messages.len(), 3);
        assert_eq!(
            transcript.messages[0].text,
            "Meu chefe mudou o assunto de novo, mas quero fechar hoje"
        );
        assert_eq!(transcript.stats.system_notices, 0);
    }

    #[test]
    fn test_subject_change_with_colon_is_a_notice() {
        let raw = "09/11/2025 15:59 - Bruno: oi\n\
                   09/11/2025 16:00 - Ana changed the subject from \"Curso: turma 1\" to \"Curso: turma 2\"\n\
                   09/11/2025 16:01 - Ana mudou o assunto de \"a: b\" para \"c\"";

        let transcript = parse_export(raw, "Ana");

        assert_eq!(transcript.messages.len(), 1);
        assert_eq!(transcript.stats.system_notices, 2);
    }

    #[test]
    fn test_header_notice_closes_current_message() {
        let raw = "09/11/2025 15:59 - Bruno: oi\n\
                   09/11/2025 16:00 - Ana changed the group description\n\
                   wrapped description text";

        let transcript = parse_export(raw, "Ana");

        assert_eq!(transcript.messages.len(), 1);
        assert_eq!(transcript.messages[0].text, "oi");
        assert_eq!(transcript.stats.orphan_lines, 1);
    }

    #[test]
    fn test_leading_continuation_is_ignored() {
        let raw = "some preamble\n09/11/2025 15:59 - Bruno: oi";
        let transcript = parse_export(raw, "Ana");

        assert_eq!(transcript.messages.len(), 1);
        assert_eq!(transcript.stats.orphan_lines, 1);
    }

    #[test]
    fn test_consecutive_headers_same_author_do_not_merge() {
        let raw = "09/11/2025 15:59 - Bruno: oi\n09/11/2025 15:59 - Bruno: tudo bem?";
        let transcript = parse_export(raw, "Ana");
        assert_eq!(transcript.messages.len(), 2);
    }

    #[test]
    fn test_blank_body_is_kept() {
        let raw = "09/11/2025 15:59 - Bruno:\n09/11/2025 16:00 - Bruno: <Mídia oculta>";
        let transcript = parse_export(raw, "Ana");

        assert_eq!(transcript.messages.len(), 2);
        assert_eq!(transcript.messages[0].text, "");
        assert_eq!(transcript.messages[1].text, "<Mídia oculta>");
    }

    #[test]
    fn test_only_first_colon_splits_author() {
        let transcript = parse_export("09/11/2025 15:59 - Bruno: horário: 10:30", "Ana");
        assert_eq!(transcript.messages[0].text, "horário: 10:30");
    }

    #[test]
    fn test_unrecognised_format_falls_back_to_raw_text() {
        let raw = "[09/11/2025, 15:59:01] Bruno: oi\n[09/11/2025, 16:00:12] Ana: olá\n";
        let transcript = parse_export(raw, "Ana");

        assert!(transcript.stats.fallback);
        assert_eq!(transcript.messages.len(), 1);
        assert_eq!(transcript.messages[0].speaker, Speaker::Other);
        assert_eq!(transcript.messages[0].text, raw);
        assert_eq!(transcript.raw_text, raw);
    }

    #[test]
    fn test_render_after_parse() {
        let raw = "09/11/2025 15:59 - Bruno: oi\n09/11/2025 16:00 - Ana: olá";
        let transcript = parse_export(raw, "ana");
        assert_eq!(
            transcript.render(&SpeakerLabels::default()),
            "CLIENT: oi\nSELLER: olá"
        );
    }

    #[test]
    fn test_parse_export_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chat.txt");
        std::fs::write(&path, "09/11/2025 15:59 - Bruno: oi\n").unwrap();

        let transcript = parse_export_file(&path, "Ana").unwrap();
        assert_eq!(transcript.messages.len(), 1);

        assert!(parse_export_file(&dir.path().join("missing.txt"), "Ana").is_err());
    }
}
