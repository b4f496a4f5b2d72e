//! Generation of shell scripts that download discovered repositories.
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::ImportMapConfig;
use crate::errors::{ImportMapError, Result};
use crate::types::RepoRecord;

/// Loads a repository list written by discovery.
pub fn load_repos(path: &Path) -> Result<Vec<RepoRecord>> {
    let contents = fs::read_to_string(path).map_err(|e| ImportMapError::File {
        message: format!("failed to read repository list: {e}"),
        path: path.display().to_string(),
    })?;
    serde_json::from_str(&contents).map_err(|e| ImportMapError::Parse {
        message: format!("invalid repository list: {e}"),
        path: path.display().to_string(),
    })
}

/// Path of the crawl script for dataset `ds`.
pub fn script_path(basedir: &Path, ds: usize) -> PathBuf {
    basedir.join(format!("crawl_dataset{ds:02}.sh"))
}

/// Renders the crawl script for dataset `ds`.
///
/// `projects` pairs each repository with its index inside the dataset.
pub fn render_script(
    ds: usize,
    token: &str,
    config: &ImportMapConfig,
    projects: &[(usize, &RepoRecord)],
) -> String {
    let mut script = String::from("#!/bin/bash\n\n");
    script.push_str(&format!("APIKEY={token}\n\n"));
    script.push_str("function download_git_project\n{\n");
    script.push_str("\tlocal ds=$1\n\tlocal projdir=$2\n\tlocal projname=$3\n");
    script.push_str("\tmkdir -p dataset$ds/$projdir\n");
    if config.git_clone {
        script.push_str(concat!(
            "\tmkdir -p /tmp/dataset$ds/$projdir\n",
            "\tlocal currdir=$(pwd)\n",
            "\tcd /tmp/dataset$ds/$projdir\n",
            "\tgit clone https://github.com/$projdir/$projname.git &>> $currdir/dataset$ds/git-download.log\n",
            "\ttar -czf $currdir/dataset$ds/$projdir/$projname.tar.gz $projname/\n",
            "\tcd $currdir\n",
            "\trm -rf /tmp/dataset$ds/$projdir\n",
            "\tsleep 1\n",
        ));
    } else {
        let api_url = config.discovery.api_url.trim_end_matches('/');
        script.push_str("\tlocal fname=dataset$ds/$projdir/$projname.tgz\n");
        script.push_str("\twhile [ ! -f $fname -a ! -f $fname.error ] ; do\n");
        script.push_str(&format!(
            "\t\tcurl -L -H \"Authorization: token $APIKEY\" \"{api_url}/repos/$projdir/$projname/tarball\" 2>/dev/null > $fname\n"
        ));
        script.push_str(concat!(
            "\t\tif ! gzip -t $fname 2>/dev/null ; then\n",
            "\t\t\tif grep -qi \"API rate limit exceeded\" $fname ; then\n",
            "\t\t\t\trm $fname\n",
            "\t\t\t\techo \"COOLING OFF\"\n",
            "\t\t\t\tsleep 60\n",
            "\t\t\telse\n",
            "\t\t\t\tmv $fname $fname.error\n",
            "\t\t\t\techo \"Skipping project $projdir/$projname\"\n",
            "\t\t\t\tbreak\n",
            "\t\t\tfi\n",
            "\t\tfi\n",
            "\t\tsleep 1\n",
            "\tdone\n",
        ));
    }
    script.push_str("}\n\n");

    for (index, repo) in projects {
        let (owner, name) = repo.owner_and_name();
        script.push_str(&format!(
            "echo \"#{index} [{} stars] - {name}\" ; download_git_project {ds:02} {owner} {name}\n",
            repo.stars
        ));
    }
    script
}

/// Writes one crawl script per `max_projects_per_script` repositories, most
/// starred first.
///
/// Returns the paths of the written scripts.
pub fn write_crawl_scripts(
    basedir: &Path,
    repos: &[RepoRecord],
    token: &str,
    config: &ImportMapConfig,
) -> Result<Vec<PathBuf>> {
    let mut sorted: Vec<&RepoRecord> = repos.iter().collect();
    sorted.sort_by(|a, b| b.stars.cmp(&a.stars));

    let chunk_size = config.max_projects_per_script.max(1);
    let mut written = Vec::new();
    for (chunk_index, chunk) in sorted.chunks(chunk_size).enumerate() {
        let ds = chunk_index + 1;
        let projects: Vec<(usize, &RepoRecord)> = chunk.iter().copied().enumerate().collect();
        let script = render_script(ds, token, config, &projects);

        let path = script_path(basedir, ds);
        fs::write(&path, script).map_err(|e| ImportMapError::File {
            message: format!("failed to write crawl script: {e}"),
            path: path.display().to_string(),
        })?;
        make_executable(&path)?;
        tracing::info!(path = %path.display(), projects = chunk.len(), "wrote crawl script");
        written.push(path);
    }
    Ok(written)
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))?;
    Ok(())
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}
