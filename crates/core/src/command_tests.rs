use crate::command::CommandParser;
use crate::trigger::FeedbackChannel;
use review_warden_engines::FocusArea;

#[test]
fn test_plain_command_uses_defaults() {
    let parser = CommandParser::new(None);

    let command = parser.parse("/review").unwrap();

    assert_eq!(command.channels, vec![FeedbackChannel::Comment]);
    assert_eq!(command.focus, FocusArea::ALL.to_vec());
}

#[test]
fn test_command_with_features_and_focus() {
    let parser = CommandParser::new(None);

    let command = parser
        .parse("/review --features comment,status --focus security")
        .unwrap();

    assert_eq!(
        command.channels,
        vec![FeedbackChannel::Comment, FeedbackChannel::Status]
    );
    assert_eq!(command.focus, vec![FocusArea::Security]);
}

#[test]
fn test_ordinary_comments_are_not_commands() {
    let parser = CommandParser::new(None);

    assert!(parser.parse("Looks good to me!").is_none());
    assert!(parser.parse("").is_none());
    assert!(parser.parse("Please review this when you can").is_none());
    assert!(parser.parse("see the review guidelines").is_none());
}

#[test]
fn test_command_must_start_the_line() {
    let parser = CommandParser::new(None);

    assert!(parser.parse("could you /review this?").is_none());
}

#[test]
fn test_longer_words_starting_with_command_are_rejected() {
    let parser = CommandParser::new(None);

    assert!(parser.parse("/reviews please").is_none());
}

#[test]
fn test_command_found_on_a_later_line() {
    let parser = CommandParser::new(None);

    let command = parser
        .parse("Thanks for the changes!\n\n/review --focus logic")
        .unwrap();

    assert_eq!(command.focus, vec![FocusArea::Logic]);
}

#[test]
fn test_invalid_flag_values_fall_back_to_defaults() {
    let parser = CommandParser::new(None);

    let command = parser
        .parse("/review --features bogus,nonsense --focus what")
        .unwrap();

    assert_eq!(command.channels, vec![FeedbackChannel::Comment]);
    assert_eq!(command.focus, FocusArea::ALL.to_vec());
}

#[test]
fn test_partially_invalid_flag_values_keep_valid_entries() {
    let parser = CommandParser::new(None);

    let command = parser
        .parse("/review --features bogus,review --focus security,what")
        .unwrap();

    assert_eq!(command.channels, vec![FeedbackChannel::Review]);
    assert_eq!(command.focus, vec![FocusArea::Security]);
}

#[test]
fn test_unknown_flags_are_ignored() {
    let parser = CommandParser::new(None);

    let command = parser
        .parse("/review --verbose --focus performance --dry-run")
        .unwrap();

    assert_eq!(command.focus, vec![FocusArea::Performance]);
    assert_eq!(command.channels, vec![FeedbackChannel::Comment]);
}

#[test]
fn test_bot_mention_required_when_configured() {
    let parser = CommandParser::new(Some("review-bot".to_string()));

    assert!(parser.parse("/review").is_none());
    assert!(parser.parse("@other-bot /review").is_none());

    let command = parser.parse("@review-bot /review --focus security").unwrap();
    assert_eq!(command.focus, vec![FocusArea::Security]);
}

#[test]
fn test_bot_mention_must_be_a_full_word() {
    let parser = CommandParser::new(Some("review-bot".to_string()));

    assert!(parser.parse("@review-bot2 /review").is_none());
}

#[test]
fn test_blank_bot_username_behaves_like_none() {
    let parser = CommandParser::new(Some("  ".to_string()));

    assert!(parser.parse("/review").is_some());
}

#[test]
fn test_leading_whitespace_is_tolerated() {
    let parser = CommandParser::new(None);

    assert!(parser.parse("   /review").is_some());
}
