fn main() {
    // ESP-IDF link arguments only matter for the device build; host builds
    // (tests, fuzzing) skip embuild entirely.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
