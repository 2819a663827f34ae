use super::EXIT_SUCCESS;
use fnpack_core::{CoreError, Engine};
use fnpack_schema::parse_query_reader;

/// Read the query from stdin and print `{"build_hash", "filename"}` as one
/// line on stdout.
pub fn run() -> Result<u8, CoreError> {
    let request = parse_query_reader(std::io::stdin().lock())?;
    let identity = Engine::fingerprint(&request)?;
    let line = serde_json::to_string(&identity).map_err(std::io::Error::from)?;
    println!("{line}");
    Ok(EXIT_SUCCESS)
}
