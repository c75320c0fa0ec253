use std::{
    fs,
    path::{Path, PathBuf},
    sync::Once,
};

use shade_shared::log::LevelFilter;
use simple_logger::SimpleLogger;

const TEST_RESULT_FOLDER: &str = "test_results";

/// Installs a logger that prints everything down to the trace level. Can be called from every test.
pub fn setup_logger() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        // Another logger might already be installed when the tests of several crates share a process.
        let _ = SimpleLogger::new().with_level(LevelFilter::Trace).init();
    });
}

/// Creates an empty folder in which the test with the given function name can write its results.
///
/// The folder is removed and recreated so that the results of a previous run don't leak into the new one.
pub fn create_test_result_folder_for_function(function_name: &str) -> PathBuf {
    let folder = Path::new(TEST_RESULT_FOLDER).join(function_name.replace("::", "."));
    let _ = fs::remove_dir_all(&folder);
    fs::create_dir_all(&folder).unwrap_or_else(|err| panic!("Failed to create the test result folder {folder:?}: {err}"));
    println!("The results of this test will be written to the following folder: {}", folder.display());
    folder
}
