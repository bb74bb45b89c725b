fn main() {
    uniffi::generate_scaffolding("src/bleekware.udl").unwrap();
}
