//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `memo_core` linkage.
//! - Run a scripted session (sign-up, memos, account deletion) against an
//!   in-memory backend so the whole flow can be eyeballed.
//!
//! Set `MEMO_LOG_DIR` to an absolute path to get rotating log files instead
//! of warnings on stderr.

use log::info;
use memo_core::app::pages::{LoginPage, MemoPage, ProfilePage};
use memo_core::{AppConfig, AppContext, LogTarget, Route};
use std::error::Error;
use std::process::ExitCode;
use std::sync::Arc;

fn main() -> ExitCode {
    println!("memo_core ping={}", memo_core::ping());
    println!("memo_core version={}", memo_core::core_version());

    if let Err(err) = init_logging() {
        eprintln!("logging disabled: {err}");
    }

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("failed to start runtime: {err}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(async { run_demo() }) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("demo failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging() -> Result<(), String> {
    match std::env::var("MEMO_LOG_DIR") {
        Ok(dir) => memo_core::init_logging(
            memo_core::default_log_level(),
            LogTarget::directory(&dir)?,
        ),
        Err(_) => memo_core::init_logging("warn", LogTarget::Stderr),
    }
}

fn run_demo() -> Result<(), Box<dyn Error>> {
    let ctx = AppContext::open_in_memory(AppConfig::default())?;
    ctx.start();
    println!("route /memo -> {:?}", ctx.navigate(Route::Memo));

    let login = LoginPage::mount(Arc::clone(&ctx));
    login.set_email("demo@example.com");
    login.set_password("secret1");
    println!("sign-in -> {:?}", login.submit());
    print_dialog(&ctx);
    ctx.modal().trigger_primary();
    login.set_nickname("Demo");
    println!("sign-up ({:?}) -> {:?}", login.mode(), login.submit());
    println!("route now {}", ctx.current_route().path());

    let memos = MemoPage::mount(Arc::clone(&ctx))?;
    for text in ["  buy oat milk  ", "call the bank", "book dentist"] {
        memos.set_draft(text);
        memos.save();
    }
    print_memos(&memos);
    memos.toggle_sort();
    print_memos(&memos);

    if let Some(oldest) = memos.memos().first() {
        memos.request_delete(&oldest.id);
        print_dialog(&ctx);
        ctx.modal().trigger_primary();
    }
    print_memos(&memos);

    let profile = ProfilePage::mount(Arc::clone(&ctx))?;
    println!("profile nickname={}", profile.nickname());
    profile.request_delete_account();
    ctx.modal().trigger_primary();
    drop(memos);
    println!(
        "after deletion: route={} signed_in={}",
        ctx.current_route().path(),
        ctx.auth().snapshot().is_signed_in()
    );

    info!("event=cli_demo module=cli status=ok");
    Ok(())
}

fn print_dialog(ctx: &AppContext) {
    let view = ctx.modal().view();
    println!(
        "dialog [{}] {}: {}",
        view.kind.as_str(),
        view.title,
        view.message.replace('\n', " ")
    );
}

fn print_memos(page: &MemoPage) {
    println!("memos ({}):", page.order().as_str());
    for memo in page.memos() {
        println!("  {} {}", page.display_time(&memo), memo.content);
    }
}
