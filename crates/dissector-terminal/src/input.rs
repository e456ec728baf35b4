//! Collecting root identifiers from the command line and stdin.

use std::io::Read;
use std::path::Path;

const STDIN_PATH: &str = "/dev/stdin";

/// Splits piped input into root identifiers, any whitespace separates them.
pub fn split_tokens(text: &str) -> impl Iterator<Item = String> + '_ {
	text.split_whitespace().map(str::to_owned)
}

/// Whether `path` is a pipe or FIFO.
///
/// Terminals, regular files and character devices such as `/dev/null` are not,
/// an inherited stdin of that kind may never reach end of file.
#[cfg(unix)]
pub fn is_pipe(path: impl AsRef<Path>) -> bool {
	use std::os::unix::fs::FileTypeExt;
	std::fs::metadata(path)
		.map(|m| m.file_type().is_fifo())
		.unwrap_or(false)
}

#[cfg(not(unix))]
pub fn is_pipe(_path: impl AsRef<Path>) -> bool {
	false
}

/// Positional roots followed by tokens piped into stdin.
pub fn read_roots(positional: &[String]) -> std::io::Result<Vec<String>> {
	let mut roots = positional.to_vec();

	if is_pipe(STDIN_PATH) {
		let mut text = String::new();
		std::io::stdin().lock().read_to_string(&mut text)?;
		roots.extend(split_tokens(&text));
	}

	log::debug!("{} roots", roots.len());
	Ok(roots)
}
