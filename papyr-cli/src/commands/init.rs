//! Init command: scaffold a new project.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;

const DEFAULT_CONFIG: &str = r#"site:
  title: My Blog
  author: Anonymous
  description: Notes and articles
  url: https://example.com

paths:
  content: content
  output: public

# base_url: /
# highlight_theme: InspiredGitHub
# unknown_shortcodes: abort   # or: skip
"#;

const SAMPLE_POST: &str = r#"+++
date = "2024-06-01"
slug = "hello-world"
categories = ['meta']
tags = ['hello']
title = "Hello, World"
type = "post"
+++
Welcome to your new site. Articles are Markdown files with front matter,
fenced code, and shortcode blocks.

{{< note >}}
Edit `content/hello-world.md` to get started.
{{< /note >}}

{{< highlight go "linenos=table,linenostart=1" >}}
package main

import "fmt"

func main() {
	fmt.Println("hello, world")
}
{{< / highlight >}}
"#;

pub fn init_project(path: Option<&Path>) -> Result<()> {
    let root = path.unwrap_or_else(|| Path::new("."));
    let config_path = root.join("papyr.yml");
    if config_path.exists() {
        bail!("{config_path:?} already exists");
    }

    let content_dir = root.join("content");
    fs::create_dir_all(&content_dir)
        .with_context(|| format!("Failed to create {content_dir:?}"))?;

    fs::write(&config_path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write {config_path:?}"))?;

    let sample_path = content_dir.join("hello-world.md");
    if !sample_path.exists() {
        fs::write(&sample_path, SAMPLE_POST)
            .with_context(|| format!("Failed to write {sample_path:?}"))?;
    }

    println!("Initialized papyr project in {}", root.display());
    println!("Next: papyr --config {} build", config_path.display());
    Ok(())
}
