fn main() {
    pickaxe::main();
}
