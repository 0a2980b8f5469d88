use super::*;

pub(crate) fn run() -> Result {
    for algorithm in Algorithm::ALL {
        println!(
            "{:<16}{:<12}{}",
            algorithm.name(),
            algorithm.family().to_string(),
            algorithm.aliases().join(", ")
        );
    }

    Ok(())
}
