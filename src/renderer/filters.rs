use std::{
    io::Write,
    process::{Command, Stdio},
    thread,
};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use minijinja::{Environment, Error, ErrorKind};

const GPG: &str = "gpg";

/// Installs the custom filters. `gpg_decrypt` is only added when a `gpg`
/// executable is on `PATH`.
pub fn register(env: &mut Environment) {
    env.add_filter("b64encode", b64encode);
    env.add_filter("b64decode", b64decode);
    if which::which(GPG).is_ok() {
        env.add_filter("gpg_decrypt", gpg_decrypt);
    } else {
        log::debug!("{} not found on PATH, gpg_decrypt is unavailable", GPG);
    }
}

pub fn b64encode(value: &str) -> String {
    BASE64.encode(value.as_bytes())
}

pub fn b64decode(value: &str) -> Result<String, Error> {
    let bytes = BASE64.decode(value.trim()).map_err(|e| {
        Error::new(ErrorKind::InvalidOperation, "b64decode: invalid base64").with_source(e)
    })?;
    String::from_utf8(bytes).map_err(|e| {
        Error::new(ErrorKind::InvalidOperation, "b64decode: result is not UTF-8").with_source(e)
    })
}

/// Decrypts an armored message with the default keyring.
pub fn gpg_decrypt(value: &str) -> Result<String, Error> {
    let mut command = Command::new(GPG);
    command.args(["--batch", "--quiet", "--decrypt"]);
    pipe_through(command, value)
}

/// Feeds `input` to `command` and returns its stdout. stdin is written from
/// a separate thread so a child filling its stdout pipe cannot block us.
fn pipe_through(mut command: Command, input: &str) -> Result<String, Error> {
    let failed = |message: String| Error::new(ErrorKind::InvalidOperation, message);
    let program = command.get_program().to_string_lossy().to_string();

    let mut child = command
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| failed(format!("gpg_decrypt: failed to run {}: {}", program, e)))?;

    let stdin = child.stdin.take();
    let (written, output) = thread::scope(|scope| {
        let writer = scope.spawn(move || match stdin {
            // stdin is dropped at the end, closing the pipe
            Some(mut stdin) => stdin.write_all(input.as_bytes()),
            None => Ok(()),
        });
        let output = child.wait_with_output();
        (writer.join(), output)
    });

    let output = output.map_err(|e| failed(format!("gpg_decrypt: {}", e)))?;
    if !output.status.success() {
        return Err(failed(format!(
            "gpg_decrypt: {} exited with {}: {}",
            program,
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    match written {
        Ok(Ok(())) => {}
        Ok(Err(e)) => return Err(failed(format!("gpg_decrypt: failed to write input: {}", e))),
        Err(_) => return Err(failed("gpg_decrypt: input writer panicked".to_string())),
    }

    String::from_utf8(output.stdout)
        .map_err(|_| failed("gpg_decrypt: plaintext is not UTF-8".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base64_round_trip() {
        for text in ["", "hello world", "zażółć gęślą jaźń", "line\nbreak"] {
            assert_eq!(b64decode(&b64encode(text)).unwrap(), text);
        }
        assert_eq!(b64encode("hello"), "aGVsbG8=");
        assert_eq!(b64decode("aGVsbG8=\n").unwrap(), "hello");
    }

    #[test]
    fn test_b64decode_rejects_garbage() {
        assert!(b64decode("not base64!").is_err());
        // 0xff 0xfe is valid base64 but not UTF-8
        assert!(b64decode("//4=").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_large_input_does_not_block() {
        // more than a pipe buffer in both directions
        let input = "0123456789abcdef\n".repeat(64 * 1024);
        let output = pipe_through(Command::new("cat"), &input).unwrap();
        assert_eq!(output.len(), input.len());
        assert_eq!(output, input);
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_command_reports_stderr() {
        let mut command = Command::new("sh");
        command.args(["-c", "cat > /dev/null; echo 'no secret key' >&2; exit 2"]);
        let err = pipe_through(command, "ciphertext").unwrap_err();
        assert!(err.to_string().contains("no secret key"));
    }

    #[test]
    fn test_gpg_decrypt_rejects_plain_text() {
        if which::which(GPG).is_err() {
            return;
        }
        assert!(gpg_decrypt("this is not an OpenPGP message\n").is_err());
    }

    #[test]
    fn test_filters_in_template() {
        let mut env = Environment::new();
        register(&mut env);
        let rendered = env
            .render_str("{{ 'secret' | b64encode }} {{ 'c2VjcmV0' | b64decode }}", minijinja::context! {})
            .unwrap();
        assert_eq!(rendered, "c2VjcmV0 secret");
    }
}
