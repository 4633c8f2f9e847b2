use assert_cmd::Command;

pub fn dompet_bin() -> Command {
    #[allow(deprecated)]
    {
        Command::cargo_bin("dompet").expect("dompet test binary should build")
    }
}
