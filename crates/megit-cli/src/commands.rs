use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context};
use colored::Colorize;
use megit_diff::{diff_path_maps, diff_trees};
use megit_repo::{
    Commit, FileStatus, MergeOutcome, ObjectId, ObjectKind, RepoStatus, Repository, StatusEntry, TreeDiff,
};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Init(args) => cmd_init(args),
        Command::HashObject(args) => cmd_hash_object(args),
        Command::CatFile(args) => cmd_cat_file(args),
        Command::WriteTree => {
            println!("{}", open()?.write_tree()?);
            Ok(())
        }
        Command::ReadTree(args) => {
            let repo = open()?;
            let tree = repo.get_oid(&args.tree)?;
            repo.read_tree(&tree)?;
            Ok(())
        }
        Command::Add(args) => cmd_add(args),
        Command::Commit(args) => cmd_commit(args),
        Command::Log(args) => cmd_log(args),
        Command::Show(args) => cmd_show(args),
        Command::Diff(args) => cmd_diff(args),
        Command::Checkout(args) => cmd_checkout(args),
        Command::Tag(args) => {
            let repo = open()?;
            let id = repo.get_oid(&args.commit)?;
            repo.create_tag(&args.name, id)?;
            println!("Created tag {} at {}", args.name.yellow(), id.short_hex().dimmed());
            Ok(())
        }
        Command::Branch(args) => cmd_branch(args),
        Command::Status => cmd_status(),
        Command::Merge(args) => cmd_merge(args),
        Command::MergeBase(args) => {
            let repo = open()?;
            let first = repo.get_oid(&args.first)?;
            let second = repo.get_oid(&args.second)?;
            match megit_dag::merge_base(repo.objects(), first, second)? {
                Some(base) => println!("{base}"),
                None => bail!("{} and {} have no common ancestor", args.first, args.second),
            }
            Ok(())
        }
        Command::Reset(args) => {
            let repo = open()?;
            let id = repo.get_oid(&args.commit)?;
            repo.reset(id)?;
            println!("HEAD is now at {}", id.short_hex().yellow());
            Ok(())
        }
        Command::Fetch(args) => cmd_fetch(args),
        Command::Push(args) => cmd_push(args),
    }
}

fn open() -> anyhow::Result<Repository> {
    let cwd = std::env::current_dir()?;
    Ok(Repository::discover(&cwd)?)
}

fn parse_kind(tag: &str) -> anyhow::Result<ObjectKind> {
    ObjectKind::parse(tag).ok_or_else(|| anyhow!("unknown object type {tag:?}"))
}

fn cmd_init(args: InitArgs) -> anyhow::Result<()> {
    let path = match args.path {
        Some(path) => path,
        None => std::env::current_dir()?,
    };
    let repo = Repository::init(&path)?;
    println!(
        "{} Initialized megit repository in {}",
        "✓".green().bold(),
        repo.metadata_dir().display().to_string().bold()
    );
    Ok(())
}

fn cmd_hash_object(args: HashObjectArgs) -> anyhow::Result<()> {
    let repo = open()?;
    let kind = parse_kind(&args.kind)?;
    let data = std::fs::read(&args.file).with_context(|| format!("reading {}", args.file.display()))?;
    println!("{}", repo.hash_object(&data, kind)?);
    Ok(())
}

fn cmd_cat_file(args: CatFileArgs) -> anyhow::Result<()> {
    let repo = open()?;
    let id = repo.get_oid(&args.object)?;
    let expected = args.kind.as_deref().map(parse_kind).transpose()?;
    let data = repo.get_object(&id, expected)?;
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&data)?;
    stdout.flush()?;
    Ok(())
}

fn cmd_add(args: AddArgs) -> anyhow::Result<()> {
    let repo = open()?;
    let paths = resolve_paths(&std::env::current_dir()?, &args.paths)?;
    let staged = repo.add(&paths)?;
    println!("  {} {} file(s)", "staged:".green(), staged);
    Ok(())
}

/// Anchor command-line paths at `cwd`, which may be below the repository
/// root.
fn resolve_paths(cwd: &Path, paths: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
    paths
        .iter()
        .map(|path| {
            let abs = cwd.join(path);
            if !abs.exists() {
                bail!("pathspec {} did not match any files", path.display());
            }
            Ok(abs)
        })
        .collect()
}

fn cmd_commit(args: CommitArgs) -> anyhow::Result<()> {
    let repo = open()?;
    let id = repo.commit(&args.message)?;
    let branch = repo.get_branch_name()?.unwrap_or_else(|| "detached HEAD".into());
    println!("[{} {}] {}", branch.yellow(), id.short_hex().dimmed(), first_line(&args.message));
    Ok(())
}

fn first_line(message: &str) -> &str {
    message.lines().next().unwrap_or("")
}

fn cmd_log(args: LogArgs) -> anyhow::Result<()> {
    let repo = open()?;
    let start = repo.get_oid(&args.commit)?;
    let limit = args.limit.unwrap_or(usize::MAX);
    for entry in repo.log([start])?.take(limit) {
        let entry = entry?;
        let decoration = if entry.refs.is_empty() {
            String::new()
        } else {
            format!(" ({})", entry.refs.join(", ")).green().to_string()
        };
        if args.oneline {
            println!(
                "{}{} {}",
                entry.oid.short_hex().yellow(),
                decoration,
                first_line(&entry.commit.message)
            );
        } else {
            print_commit(&entry.oid, &entry.commit, &decoration);
            println!();
        }
    }
    Ok(())
}

fn print_commit(id: &ObjectId, commit: &Commit, decoration: &str) {
    println!("{} {}{}", "commit".yellow(), id.to_string().yellow(), decoration);
    if commit.parents.len() > 1 {
        let parents: Vec<String> = commit.parents.iter().map(ObjectId::short_hex).collect();
        println!("Merge: {}", parents.join(" "));
    }
    println!();
    for line in commit.message.lines() {
        println!("    {line}");
    }
}

fn cmd_show(args: ShowArgs) -> anyhow::Result<()> {
    let repo = open()?;
    let id = repo.get_oid(&args.commit)?;
    let commit = repo.get_commit(&id)?;
    print_commit(&id, &commit, "");
    println!();

    let parent_tree = match commit.first_parent() {
        Some(parent) => Some(repo.get_commit(parent)?.tree),
        None => None,
    };
    let changes = diff_trees(repo.objects(), parent_tree.as_ref(), Some(&commit.tree))?;
    print_diff(&repo, &changes, false)
}

fn cmd_diff(args: DiffArgs) -> anyhow::Result<()> {
    let repo = open()?;
    let changes = match args.commits.as_slice() {
        [] => repo.diff_working()?,
        [commit] => {
            let id = repo.get_oid(commit)?;
            let files = repo.get_tree(&repo.get_commit(&id)?.tree, "")?;
            diff_path_maps(&files, &repo.get_working_tree()?)
        }
        [old, new] => repo.diff_commits(&repo.get_oid(old)?, &repo.get_oid(new)?)?,
        _ => bail!("diff takes at most two commits"),
    };
    print_diff(&repo, &changes, args.stat)
}

fn print_diff(repo: &Repository, changes: &TreeDiff, stat: bool) -> anyhow::Result<()> {
    for change in &changes.changes {
        let path = change.path();
        if stat {
            let code = match change.code() {
                'A' => "A".green(),
                'D' => "D".red(),
                other => other.to_string().yellow(),
            };
            println!("{code}  {path}");
            continue;
        }
        let blob_diff = repo.diff_change(change)?;
        let old_label = match change.old_id() {
            Some(_) => format!("a/{path}"),
            None => "/dev/null".to_string(),
        };
        let new_label = match change.new_id() {
            Some(_) => format!("b/{path}"),
            None => "/dev/null".to_string(),
        };
        println!("{}", format!("diff --megit a/{path} b/{path}").bold());
        for line in blob_diff.render_unified(&old_label, &new_label).lines() {
            if line.starts_with("+++") || line.starts_with("---") {
                println!("{}", line.bold());
            } else if line.starts_with("@@") {
                println!("{}", line.cyan());
            } else if line.starts_with('+') {
                println!("{}", line.green());
            } else if line.starts_with('-') {
                println!("{}", line.red());
            } else {
                println!("{line}");
            }
        }
    }
    Ok(())
}

fn cmd_checkout(args: CheckoutArgs) -> anyhow::Result<()> {
    let repo = open()?;
    let id = repo.checkout(&args.name)?;
    match repo.get_branch_name()? {
        Some(branch) => println!("Switched to branch {}", branch.yellow().bold()),
        None => println!("HEAD is now at {} (detached)", id.short_hex().yellow()),
    }
    Ok(())
}

fn cmd_branch(args: BranchArgs) -> anyhow::Result<()> {
    let repo = open()?;
    if let Some(name) = &args.name {
        let id = repo.get_oid(&args.start_point)?;
        repo.create_branch(name, id)?;
        println!("Created branch {} at {}", name.yellow(), id.short_hex().dimmed());
        return Ok(());
    }

    let current = repo.get_branch_name()?;
    for name in repo.iter_branch_names()? {
        if current.as_deref() == Some(name.as_str()) {
            println!("* {}", name.green().bold());
        } else {
            println!("  {name}");
        }
    }
    Ok(())
}

fn cmd_status() -> anyhow::Result<()> {
    let repo = open()?;
    let status = repo.status()?;
    print_status(&status);
    Ok(())
}

fn print_status(status: &RepoStatus) {
    match (&status.branch, &status.head) {
        (Some(branch), _) => println!("On branch {}", branch.yellow().bold()),
        (None, Some(head)) => println!("HEAD detached at {}", head.short_hex().yellow()),
        (None, None) => println!("HEAD detached"),
    }
    if status.head.is_none() {
        println!("\nNo commits yet");
    }
    if let Some(merge_head) = &status.merge_head {
        println!(
            "\nMerging {}; commit to conclude the merge.",
            merge_head.short_hex().yellow()
        );
    }

    let changes = &status.changes;
    if changes.is_clean() {
        println!("\nNothing to commit, working tree clean.");
        return;
    }
    print_entries("Changes to be committed:", &changes.staged, |s| s.green());
    print_entries("Changes not staged for commit:", &changes.unstaged, |s| s.red());
    if !changes.untracked.is_empty() {
        println!("\nUntracked files:");
        for path in &changes.untracked {
            println!("        {}", path.red());
        }
    }
}

fn print_entries(
    title: &str,
    entries: &[StatusEntry],
    paint: impl Fn(&str) -> colored::ColoredString,
) {
    if entries.is_empty() {
        return;
    }
    println!("\n{title}");
    for entry in entries {
        let label = match entry.status {
            FileStatus::New => "new file:",
            FileStatus::Modified => "modified:",
            FileStatus::Deleted => "deleted: ",
        };
        println!("        {}", paint(&format!("{label}   {}", entry.path)));
    }
}

fn cmd_merge(args: MergeArgs) -> anyhow::Result<()> {
    let repo = open()?;
    let other = repo.get_oid(&args.commit)?;
    match repo.merge(other)? {
        MergeOutcome::UpToDate => println!("Already up to date."),
        MergeOutcome::FastForward { from, to } => {
            println!("Updating {}..{}", from.short_hex(), to.short_hex());
            println!("{} Fast-forward", "✓".green());
        }
        MergeOutcome::Merged { conflicts, .. } if conflicts.is_empty() => {
            println!("{} Merged {}; commit to conclude.", "✓".green(), args.commit.yellow());
        }
        MergeOutcome::Merged { conflicts, .. } => {
            for conflict in &conflicts {
                println!("{} {} ({:?})", "CONFLICT".red().bold(), conflict.path, conflict.kind);
            }
            println!("Fix conflicts, add the files, then commit the result.");
        }
    }
    Ok(())
}

fn remote_label(path: &Path) -> String {
    path.display().to_string()
}

fn cmd_fetch(args: FetchArgs) -> anyhow::Result<()> {
    let repo = open()?;
    let result = repo.fetch(&args.path, &args.name)?;
    println!("From {}", remote_label(&args.path).bold());
    for update in &result.refs_updated {
        if update.is_noop() {
            continue;
        }
        let from = update.old.map(|id| id.short_hex()).unwrap_or_else(|| "(new)".into());
        println!("   {}..{}  {}", from, update.new.short_hex(), update.name.yellow());
    }
    println!("{} objects received", result.objects_received);
    Ok(())
}

fn cmd_push(args: PushArgs) -> anyhow::Result<()> {
    let repo = open()?;
    let result = repo.push(&args.path, &args.branch)?;
    let update = &result.ref_update;
    let from = update.old.map(|id| id.short_hex()).unwrap_or_else(|| "(new)".into());
    println!("To {}", remote_label(&args.path).bold());
    println!("   {}..{}  {}", from, update.new.short_hex(), update.name.yellow());
    println!("{} objects sent", result.objects_sent);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn add_paths_are_relative_to_the_invoking_directory() {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir_all(&sub).unwrap();
        fs::write(sub.join("f"), "nested").unwrap();
        fs::write(dir.path().join("f"), "top").unwrap();

        let paths = resolve_paths(&sub, &[PathBuf::from("f")]).unwrap();
        assert_eq!(repo.add(&paths).unwrap(), 1);
        let index = repo.index().unwrap();
        assert!(index.get("sub/f").is_some());
        assert!(index.get("f").is_none());
    }

    #[test]
    fn add_paths_can_climb_out_of_a_subdirectory() {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir_all(&sub).unwrap();
        fs::write(dir.path().join("top"), "t").unwrap();

        let paths = resolve_paths(&sub, &[PathBuf::from("../top")]).unwrap();
        repo.add(&paths).unwrap();
        assert!(repo.index().unwrap().get("top").is_some());
    }

    #[test]
    fn missing_add_path_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = resolve_paths(dir.path(), &[PathBuf::from("nope")]).unwrap_err();
        assert!(err.to_string().contains("nope"));
    }
}
