//! Interactive collection of backend parameters before a run.
//!
//! Each prompt shows the value currently configured; an empty answer keeps
//! it. Prompting happens only on the caller side, backends never read stdin.

use std::io::{self, BufRead, IsTerminal, Write};
use std::str::FromStr;

use tts_client::{BackendKind, BackendParams};

use crate::error::NarrateError;

/// Whether prompting makes sense for this process.
pub fn should_prompt(use_defaults: bool) -> bool {
    !use_defaults && io::stdin().is_terminal()
}

/// Prompt on the terminal for the parameters of `kind`.
pub fn prompt_backend_params(
    kind: BackendKind,
    params: &mut BackendParams,
) -> Result<(), NarrateError> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stderr();
    prompt_with(&mut input, &mut output, kind, params)
}

/// Prompt using arbitrary input and output streams.
pub fn prompt_with<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    kind: BackendKind,
    params: &mut BackendParams,
) -> Result<(), NarrateError> {
    let mut prompter = Prompter { input, output };

    match kind {
        BackendKind::Melo => {
            let p = &mut params.melo;
            p.speed = prompter.parsed("Enter the speed", p.speed)?;
            p.language = prompter.text("Enter the language", &p.language)?;
            p.speaker = prompter.text("Enter the speaker ID", &p.speaker)?;
        }
        BackendKind::Xtts => {
            let p = &mut params.xtts;
            p.speed = prompter.parsed("Enter the speed", p.speed)?;
            p.language = prompter.text("Enter the language", &p.language)?;
            p.model = prompter.text("Enter the model name", &p.model)?;
            p.speaker = prompter.text("Enter the speaker", &p.speaker)?;
        }
        BackendKind::Google => {
            let p = &mut params.google;
            p.lang = prompter.text("Enter the language", &p.lang)?;
            p.tld = prompter.text("Enter the Google domain", &p.tld)?;
        }
        BackendKind::Edge => {
            let p = &mut params.edge;
            p.voice = prompter.text("Enter the voice", &p.voice)?;
            p.rate = prompter.text("Enter the rate", &p.rate)?;
        }
    }
    Ok(())
}

struct Prompter<'a, R, W> {
    input: &'a mut R,
    output: &'a mut W,
}

impl<R: BufRead, W: Write> Prompter<'_, R, W> {
    /// Ask once; `None` for an empty answer or end of input.
    fn ask(&mut self, question: &str) -> Result<Option<String>, NarrateError> {
        let io_err = |e: io::Error| NarrateError::Configuration(format!("Prompt failed: {}", e));

        write!(self.output, "{}", question).map_err(io_err)?;
        self.output.flush().map_err(io_err)?;

        let mut line = String::new();
        self.input.read_line(&mut line).map_err(io_err)?;
        let answer = line.trim();
        Ok((!answer.is_empty()).then(|| answer.to_string()))
    }

    fn text(&mut self, label: &str, current: &str) -> Result<String, NarrateError> {
        let answer = self.ask(&format!("{} (default: '{}'): ", label, current))?;
        Ok(answer.unwrap_or_else(|| current.to_string()))
    }

    fn parsed<T>(&mut self, label: &str, current: T) -> Result<T, NarrateError>
    where
        T: FromStr + std::fmt::Debug,
    {
        match self.ask(&format!("{} (default: {:?}): ", label, current))? {
            None => Ok(current),
            Some(answer) => answer.parse().map_err(|_| {
                NarrateError::Configuration(format!("Invalid value for '{}': {}", label, answer))
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn run(kind: BackendKind, answers: &str) -> (BackendParams, String) {
        let mut input = Cursor::new(answers.as_bytes().to_vec());
        let mut output = Vec::new();
        let mut params = BackendParams::default();
        prompt_with(&mut input, &mut output, kind, &mut params).unwrap();
        (params, String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_empty_answers_keep_defaults() {
        let (params, transcript) = run(BackendKind::Melo, "\n\n\n");
        assert_eq!(params, BackendParams::default());
        assert!(transcript.contains("Enter the speed (default: 1.0): "));
        assert!(transcript.contains("Enter the language (default: 'EN'): "));
        assert!(transcript.contains("Enter the speaker ID (default: 'EN-BR'): "));
    }

    #[test]
    fn test_answers_override() {
        let (params, _) = run(BackendKind::Melo, "1.5\nES\nES\n");
        assert_eq!(params.melo.speed, 1.5);
        assert_eq!(params.melo.language, "ES");
        assert_eq!(params.melo.speaker, "ES");
    }

    #[test]
    fn test_end_of_input_keeps_defaults() {
        let (params, _) = run(BackendKind::Edge, "");
        assert_eq!(params.edge.voice, "pt-BR-ThalitaNeural");
        assert_eq!(params.edge.rate, "+0%");
    }

    #[test]
    fn test_xtts_model_prompt() {
        let (params, transcript) = run(BackendKind::Xtts, "\nde\n\nClaribel Dervla\n");
        assert_eq!(params.xtts.language, "de");
        assert_eq!(params.xtts.speaker, "Claribel Dervla");
        assert!(transcript.contains(
            "Enter the model name (default: 'tts_models/multilingual/multi-dataset/xtts_v2'): "
        ));
    }

    #[test]
    fn test_invalid_speed_is_configuration_error() {
        let mut input = Cursor::new(b"fast\n".to_vec());
        let mut output = Vec::new();
        let mut params = BackendParams::default();
        let err = prompt_with(&mut input, &mut output, BackendKind::Melo, &mut params).unwrap_err();
        assert!(matches!(err, NarrateError::Configuration(_)));
    }
}
