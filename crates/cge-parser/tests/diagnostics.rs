//! Diagnostic tests: errors, warnings, panic-mode recovery, and the
//! rule that any reported error suppresses the object stream.

mod common;

use cge_ast::{Pos, TokenKind};
use cge_parser::{Config, Error};
use common::{parse, parse_with, RecordingSender};

// =============================================================================
// Metadata
// =============================================================================

#[test]
fn test_missing_cge_field() {
    let out = parse("command move {}\n");

    let errors = out.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "missing required 'cge' metadata field");
    assert_eq!(errors[0].start, Pos::new(1, 0));
    // The header never parsed, so neither metadata nor objects flow.
    assert!(out.metadata.is_empty());
    assert!(out.objects.is_empty());
}

#[test]
fn test_duplicate_cge_field() {
    let out = parse("cge 0.5\ncge 0.5\ncommand move {}\n");

    let errors = out.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "duplicate 'cge' metadata field");
    assert_eq!(errors[0].start, Pos::new(2, 0));
    assert!(out.metadata.is_empty());
}

#[test]
fn test_missing_version_number() {
    let out = parse("cge\n");

    let errors = out.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].message,
        "expected version number after 'cge' keyword"
    );
}

#[test]
fn test_malformed_version_number() {
    let out = parse("cge 05\n");

    let errors = out.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "expected '.' after major version");
}

#[test]
fn test_deprecated_header_warns_three_times() {
    let out = parse("// hello\nname demo\nversion 0.5\n");

    let warnings = out.warnings();
    let messages: Vec<&str> = warnings.iter().map(|w| w.message.as_str()).collect();
    assert_eq!(
        messages,
        vec![
            "game comments are deprecated",
            "the 'name' metadata field is deprecated",
            "the 'version' metadata field is deprecated; use 'cge' instead",
        ]
    );
    assert_eq!(warnings[0].start, Pos::new(1, 0));
    assert_eq!(warnings[1].start, Pos::new(2, 0));
    assert_eq!(warnings[2].start, Pos::new(3, 0));
    assert_eq!(warnings[2].end, Pos::new(3, 7));

    assert_eq!(out.metadata, vec!["0.5"]);
    assert!(out.errors().is_empty());
    // Warnings do not suppress the object stream.
    assert_eq!(out.objects.len(), 1);
}

#[test]
fn test_disable_warnings_silences_deprecations() {
    let out = parse_with(
        "// hello\nname demo\nversion 0.5\n",
        Config {
            disable_warnings: true,
            ..Config::default()
        },
    );

    assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
    assert_eq!(out.metadata, vec!["0.5"]);
}

#[test]
fn test_incompatible_version_aborts_declarations() {
    let out = parse("cge 0.4\ncommand move {}\n");

    assert_eq!(out.metadata, vec!["0.4"]);
    let errors = out.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].message,
        "incompatible CGE version (file: 0.4, parser: 0.5)"
    );
    assert_eq!(errors[0].start, Pos::new(1, 4));
    assert_eq!(errors[0].end, Pos::new(1, 7));
    assert!(out.objects.is_empty());
}

#[test]
fn test_major_version_mismatch() {
    let out = parse("cge 1.0\n");

    let errors = out.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].message,
        "incompatible CGE version (file: 1.0, parser: 0.5)"
    );
}

// =============================================================================
// Declarations
// =============================================================================

#[test]
fn test_duplicate_command() {
    let out = parse("cge 0.5\ncommand move {}\ncommand move {}\n");

    let errors = out.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "command 'move' already defined");
    assert_eq!(errors[0].start, Pos::new(3, 8));
    assert_eq!(errors[0].end, Pos::new(3, 12));
    assert!(out.objects.is_empty());
}

#[test]
fn test_commands_and_events_have_separate_namespaces() {
    let out = parse("cge 0.5\ncommand move {}\nevent move {}\n");

    assert!(out.errors().is_empty(), "{:?}", out.diagnostics);
    assert_eq!(out.objects.len(), 3);
}

#[test]
fn test_types_and_enums_share_a_namespace() {
    let out = parse("cge 0.5\ntype thing { a: int }\nenum thing { b }\n");

    let errors = out.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "type 'thing' already defined");
    assert!(out.objects.is_empty());
}

#[test]
fn test_duplicate_config_object() {
    let out = parse("cge 0.5\nconfig {}\nconfig {}\n");

    let errors = out.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "duplicate config object");
    assert_eq!(errors[0].start, Pos::new(3, 0));
    assert!(out.objects.is_empty());
}

#[test]
fn test_undefined_type_reference() {
    let out = parse("cge 0.5\nevent tick { p: player }\n");

    let errors = out.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "undefined type 'player'.");
    assert_eq!(errors[0].start, Pos::new(2, 16));
    assert_eq!(errors[0].end, Pos::new(2, 22));
    assert!(out.objects.is_empty());
}

#[test]
fn test_inline_type_redefinition() {
    let out = parse("cge 0.5\ntype pos { x: int }\nevent spawn { p: type pos { x: int } }\n");

    let errors = out.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "type 'pos' is already defined");
    assert!(out.objects.is_empty());
}

#[test]
fn test_declaration_cycle() {
    let out = parse("cge 0.5\ntype a { b: b }\ntype b { a: a }\n");

    let errors = out.errors();
    assert!(!errors.is_empty());
    assert_eq!(errors[0].message, "declaration cycle: a->b->a");
    assert_eq!(errors[0].start, Pos::new(2, 5));
    assert!(out.objects.is_empty());
}

#[test]
fn test_self_cycle() {
    let out = parse("cge 0.5\ntype a { me: a }\n");

    let errors = out.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "declaration cycle: a->a");
}

#[test]
fn test_list_of_self_is_not_a_cycle() {
    let out = parse("cge 0.5\ntype node { children: list<node> }\n");

    assert!(out.errors().is_empty(), "{:?}", out.diagnostics);
    assert_eq!(out.objects.len(), 2);
}

// =============================================================================
// Recovery
// =============================================================================

#[test]
fn test_recovery_surfaces_independent_errors() {
    let source = "\
cge 0.5
command move { p: }
command move {}
event tick { t: unknown }
";
    let out = parse(source);

    let messages: Vec<&str> = out.errors().iter().map(|e| e.message.as_str()).collect();
    assert_eq!(
        messages,
        vec![
            "expected type after property name",
            "command 'move' already defined",
            "undefined type 'unknown'.",
        ]
    );
    assert!(out.objects.is_empty());
}

#[test]
fn test_broken_property_does_not_eat_the_block() {
    let source = "\
cge 0.5
type t {
    bad bad bad,
    good: int,
}
";
    let out = parse(source);

    let errors = out.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "expected ':' after property name");
    // No follow-on errors: `good` parsed fine after skipping to the comma.
    assert!(out.objects.is_empty());
}

#[test]
fn test_missing_block_skips_to_next_declaration() {
    let source = "\
cge 0.5
command broken
event ok {}
";
    let out = parse(source);

    let errors = out.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "expected block after command name");
}

#[test]
fn test_unclosed_block_reports_missing_brace() {
    let out = parse("cge 0.5\ncommand move { x: int\n");

    let messages: Vec<&str> = out.errors().iter().map(|e| e.message.as_str()).collect();
    assert!(
        messages.contains(&"expected '}' after block"),
        "{messages:?}"
    );
}

#[test]
fn test_scanner_error_token_carries_its_message() {
    let out = parse("cge 0.5\ncommand x { p: Bad }\n");

    let errors = out.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "unexpected character 'B'");
    assert_eq!(errors[0].start, Pos::new(2, 15));
    assert_eq!(errors[0].end, Pos::new(2, 16));
}

// =============================================================================
// Token streaming
// =============================================================================

#[test]
fn test_tokens_stream_in_source_order() {
    let out = parse_with(
        "cge 0.5\ncommand move {}\n",
        Config {
            send_tokens: true,
            ..Config::default()
        },
    );

    let kinds: Vec<TokenKind> = out.tokens.iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::CgeVersion,
            TokenKind::VersionNumber,
            TokenKind::Command,
            TokenKind::Identifier,
            TokenKind::BraceOpen,
            TokenKind::BraceClose,
        ]
    );
    // Positions never go backwards.
    let positions: Vec<Pos> = out.tokens.iter().map(|t| t.pos).collect();
    assert!(positions.windows(2).all(|w| w[0] <= w[1]), "{positions:?}");
}

#[test]
fn test_tokens_are_not_streamed_by_default() {
    let out = parse("cge 0.5\ncommand move {}\n");
    assert!(out.tokens.is_empty());
}

#[test]
fn test_error_tokens_never_reach_the_token_stream() {
    let out = parse_with(
        "cge 0.5\ncommand x { p: Bad }\n",
        Config {
            send_tokens: true,
            ..Config::default()
        },
    );

    assert!(out.tokens.iter().all(|t| t.kind != TokenKind::Error));
    assert_eq!(out.errors().len(), 1);
}

// =============================================================================
// Sender failures
// =============================================================================

#[test]
fn test_metadata_send_failure_aborts() {
    let mut sender = RecordingSender {
        fail_metadata: true,
        ..RecordingSender::default()
    };
    let result = cge_parser::parse("cge 0.5\n".as_bytes(), &mut sender, Config::default());

    assert!(matches!(result, Err(Error::Send(_))), "{result:?}");
}

#[test]
fn test_object_send_failure_aborts() {
    let mut sender = RecordingSender {
        fail_object: true,
        ..RecordingSender::default()
    };
    let result = cge_parser::parse(
        "cge 0.5\ncommand move {}\n".as_bytes(),
        &mut sender,
        Config::default(),
    );

    assert!(matches!(result, Err(Error::Send(_))), "{result:?}");
}
