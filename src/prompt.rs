//! Terminal prompts for values the operator did not pass on the command line

use std::io::{self, BufRead, Write};

/// Ask a question and return the trimmed answer, `None` at end of input
pub fn ask<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    question: &str,
) -> io::Result<Option<String>> {
    write!(output, "{question}")?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Ask until a non-empty answer is given; an empty answer takes `default` if there is one
pub fn ask_required<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    question: &str,
    default: Option<&str>,
) -> io::Result<Option<String>> {
    let question = match default {
        Some(d) => format!("{question} [{d}]: "),
        None => format!("{question}: "),
    };
    loop {
        let Some(answer) = ask(input, output, &question)? else {
            return Ok(None);
        };
        if !answer.is_empty() {
            return Ok(Some(answer));
        }
        if let Some(d) = default {
            return Ok(Some(d.to_string()));
        }
    }
}

/// Block until the operator confirms the manual sign-in with `y`
///
/// Returns `false` if input ends first.
pub fn await_login_confirmation<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
) -> io::Result<bool> {
    writeln!(output, "Sign in to the forms site in the opened browser window.")?;
    writeln!(output, "When done, return here and press 'Y' to continue.")?;
    loop {
        match ask(input, output, "Press 'Y' to continue: ")? {
            None => return Ok(false),
            Some(answer) if answer.eq_ignore_ascii_case("y") => return Ok(true),
            Some(_) => writeln!(output, "Invalid input. Press 'Y' to continue.")?,
        }
    }
}
