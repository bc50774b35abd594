//! Console line parsing.
//!
//! A line is `<name> [arguments]`. The name is the first whitespace-delimited
//! token; the arguments are the rest of the line kept as raw text, since
//! setting values such as vectors contain spaces of their own.

use thiserror::Error;

/// A console line split into name and argument text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandLine<'a> {
    /// First token, not yet case-folded.
    pub name: &'a str,
    /// Remaining text, trimmed. Empty when no arguments were given.
    pub args: &'a str,
}

/// Tokenize error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenizeError {
    #[error("empty input")]
    EmptyInput,

    #[error("unterminated string at position {position}")]
    UnterminatedString { position: usize },
}

/// Split a console line into name and arguments.
///
/// The argument text is free form. A single pair of quotes wrapping the whole argument
/// text is removed.
///
/// # Examples
///
/// ```
/// use bevy_runtime_vars::core::parse_command_line;
///
/// let line = parse_command_line("offset 1.5 2 3").unwrap();
/// assert_eq!(line.name, "offset");
/// assert_eq!(line.args, "1.5 2 3");
///
/// let line = parse_command_line(r#"player_name "Jane Doe""#).unwrap();
/// assert_eq!(line.args, "Jane Doe");
/// ```
pub fn parse_command_line(input: &str) -> Result<CommandLine<'_>, TokenizeError> {
    let line = input.trim();
    if line.is_empty() {
        return Err(TokenizeError::EmptyInput);
    }

    let (name, args) = line
        .split_once(char::is_whitespace)
        .map(|(name, rest)| (name, rest.trim()))
        .unwrap_or((line, ""));

    Ok(CommandLine {
        name,
        args: unquote(args)?,
    })
}

fn unquote(args: &str) -> Result<&str, TokenizeError> {
    let Some(first) = args.chars().next().filter(|c| *c == '"' || *c == '\'') else {
        return Ok(args);
    };
    let inner = &args[1..];
    match inner.strip_suffix(first) {
        Some(body) if !body.contains(first) => Ok(body),
        Some(_) => Ok(args),
        None if !inner.contains(first) => Err(TokenizeError::UnterminatedString { position: 0 }),
        None => Ok(args),
    }
}

/// Split a string into whitespace-separated tokens, honouring quotes.
///
/// Used by built-in commands to pick apart their argument text.
pub fn tokenize_string(input: &str) -> Result<Vec<&str>, TokenizeError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        match c {
            ' ' | '\t' | '\r' | '\n' => continue,

            '"' | '\'' => {
                let content_start = start + 1;
                let mut end = content_start;
                let mut found_end = false;

                while let Some((i, ch)) = chars.next() {
                    if ch == c {
                        found_end = true;
                        break;
                    }
                    if ch == '\\' {
                        if chars.next().is_some() {
                            end = chars.peek().map(|(i, _)| *i).unwrap_or(input.len());
                        }
                    } else {
                        end = i + ch.len_utf8();
                    }
                }

                if !found_end {
                    return Err(TokenizeError::UnterminatedString { position: start });
                }
                tokens.push(&input[content_start..end]);
            }

            _ => {
                let mut end = start + c.len_utf8();
                while let Some(&(i, ch)) = chars.peek() {
                    if matches!(ch, ' ' | '\t' | '\r' | '\n' | '"' | '\'') {
                        break;
                    }
                    end = i + ch.len_utf8();
                    chars.next();
                }
                tokens.push(&input[start..end]);
            }
        }
    }

    Ok(tokens)
}

/// Split a line on `;` into separate commands.
///
/// Semicolons inside quotes are kept.
///
/// # Examples
///
/// ```
/// use bevy_runtime_vars::core::split_commands;
///
/// let commands = split_commands("reset_setting cl_fov; toggle_setting show_fps");
/// assert_eq!(commands, vec!["reset_setting cl_fov", "toggle_setting show_fps"]);
/// ```
pub fn split_commands(input: &str) -> Vec<&str> {
    let mut commands = Vec::new();
    let mut start = 0;
    let mut in_double_quote = false;
    let mut in_single_quote = false;
    let mut backslash_count = 0;

    for (i, c) in input.char_indices() {
        match c {
            '\\' => {
                backslash_count += 1;
                continue;
            }
            // Escaped only when preceded by an odd number of backslashes.
            '"' if !in_single_quote && backslash_count % 2 == 0 => {
                in_double_quote = !in_double_quote;
            }
            '\'' if !in_double_quote && backslash_count % 2 == 0 => {
                in_single_quote = !in_single_quote;
            }
            ';' if !in_double_quote && !in_single_quote => {
                let cmd = input[start..i].trim();
                if !cmd.is_empty() {
                    commands.push(cmd);
                }
                start = i + 1;
            }
            _ => {}
        }
        backslash_count = 0;
    }

    let cmd = input[start..].trim();
    if !cmd.is_empty() {
        commands.push(cmd);
    }

    commands
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_name_only() {
        let line = parse_command_line("  show_fps  ").unwrap();
        assert_eq!(line.name, "show_fps");
        assert_eq!(line.args, "");
    }

    #[test]
    fn test_parse_keeps_argument_spaces() {
        let line = parse_command_line("offset   1.5 2  3 ").unwrap();
        assert_eq!(line.name, "offset");
        assert_eq!(line.args, "1.5 2  3");
    }

    #[test]
    fn test_parse_strips_wrapping_quotes() {
        assert_eq!(parse_command_line("name 'a b'").unwrap().args, "a b");
        assert_eq!(parse_command_line(r#"say "a" "b""#).unwrap().args, r#""a" "b""#);
        assert!(matches!(
            parse_command_line(r#"say "open"#),
            Err(TokenizeError::UnterminatedString { .. })
        ));
    }

    #[test]
    fn test_parse_keeps_slashes() {
        let line = parse_command_line("motd see http://example.com").unwrap();
        assert_eq!(line.args, "see http://example.com");
        let line = parse_command_line(r#"motd "see http://x""#).unwrap();
        assert_eq!(line.args, "see http://x");
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(parse_command_line(""), Err(TokenizeError::EmptyInput));
        assert_eq!(parse_command_line(" \t "), Err(TokenizeError::EmptyInput));
    }

    #[test]
    fn test_tokenize_string() {
        assert_eq!(tokenize_string(r#"a "b c" 'd'"#).unwrap(), vec!["a", "b c", "d"]);
        assert!(tokenize_string("   \t\n ").unwrap().is_empty());
        assert_eq!(
            tokenize_string(r#""path\\to""#).unwrap(),
            vec![r#"path\\to"#]
        );
    }

    #[test]
    fn test_split_commands() {
        assert_eq!(split_commands("a 1; b; c"), vec!["a 1", "b", "c"]);
        assert_eq!(split_commands(r#"say "x; y"; b"#), vec![r#"say "x; y""#, "b"]);
        assert!(split_commands(";;;").is_empty());
        assert!(split_commands("").is_empty());
    }

    #[test]
    fn test_split_commands_escapes() {
        assert_eq!(
            split_commands(r#"say "x\"y"; b"#),
            vec![r#"say "x\"y""#, "b"]
        );
        assert_eq!(
            split_commands(r#"say "x\\"; b"#),
            vec![r#"say "x\\""#, "b"]
        );
    }
}
