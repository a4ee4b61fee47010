fn main() {
    mindforge::board::init();
    mindforge::uci::run();
}
