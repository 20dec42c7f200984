mod cli;
mod renderer;

fn main() {
    colog::init();
    let command = cli::Command::clap_parse();
    if let Err(e) = renderer::Renderer::run_command(command) {
        // one line per cause, outermost first
        let error_chain: Vec<String> = e.chain().map(|cause| cause.to_string()).collect();
        log::error!("{}", error_chain.join("\n"));
        std::process::exit(1);
    }
}
