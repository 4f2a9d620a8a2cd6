use flashload::error::AppResult;

fn main() -> AppResult<()> {
    flashload::entry::run()
}
