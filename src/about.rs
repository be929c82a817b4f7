pub const SEQSCOUT_DISPLAY_VERSION: &str = env!("SEQSCOUT_DISPLAY_VERSION");
pub const SEQSCOUT_BUILD_N: &str = env!("SEQSCOUT_BUILD_N");

pub fn version_cli_text() -> String {
    format!(
        "seqscout {}\nBuild {}\nNCBI taxon length reports and random FASTA generation",
        SEQSCOUT_DISPLAY_VERSION, SEQSCOUT_BUILD_N
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_text_names_the_tool_and_build() {
        let text = version_cli_text();
        assert!(text.starts_with("seqscout "));
        assert!(text.contains(&format!("Build {SEQSCOUT_BUILD_N}")));
    }
}
