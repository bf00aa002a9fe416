fn main() {
    frontdiff::cli::run();
}
