//! Print a fresh API key suitable for the `API_KEY` environment variable.

fn main() {
    println!("{}", photo_core::api_key::generate_api_key());
}
