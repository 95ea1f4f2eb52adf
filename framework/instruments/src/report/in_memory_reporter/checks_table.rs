use tabled::Tabled;

#[derive(Tabled)]
pub struct CheckRow {
    pub check: String,
    pub passed: usize,
    pub failed: usize,
    #[tabled(display = "percent")]
    pub pass_rate: f64,
}

fn percent(n: &f64) -> String {
    format!("{n:.1}%")
}
