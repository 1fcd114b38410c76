fn main() {
    metalog::cli::run();
}
