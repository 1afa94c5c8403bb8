//! Initialize a new site

use anyhow::Result;
use std::fs;
use std::path::Path;

use crate::CONFIG_FILE;

/// Sample fixture written next to the config
pub const SAMPLE_FIXTURE: &str = "posts.json";

const CONFIG_TEMPLATE: &str = r#"# spacetraveling configuration

# Site
title: spacetraveling
description: ''
url: http://localhost:4000
language: pt-BR
timezone: America/Sao_Paulo
logo: /images/logo.svg

# Content source
api_endpoint: https://your-repo.cdn.prismic.io/api/v2
# access_token: ''
document_type: posts
page_size: 1

# Pages
date_format: PP
words_per_minute: 200
public_dir: public
revalidate: 43200

pagination:
  follow_cursor: false
"#;

/// Initialize a new site in the given directory
pub fn init_site(target_dir: &Path) -> Result<()> {
    fs::create_dir_all(target_dir)?;

    let config_path = target_dir.join(CONFIG_FILE);
    if config_path.exists() {
        anyhow::bail!("{:?} already exists", config_path);
    }
    fs::write(&config_path, CONFIG_TEMPLATE)?;

    let fixture = serde_json::json!({
        "results": [
            sample_post(
                "como-utilizar-hooks",
                "2021-03-15T19:25:28+0000",
                "Como utilizar Hooks",
                "Pensando em sincronização em vez de ciclos de vida.",
            ),
            sample_post(
                "criando-um-app-cra-do-zero",
                "2021-03-25T19:27:35+0000",
                "Criando um app CRA do zero",
                "Tudo sobre como criar a sua primeira aplicação utilizando Create React App",
            ),
        ]
    });
    fs::write(
        target_dir.join(SAMPLE_FIXTURE),
        serde_json::to_string_pretty(&fixture)?,
    )?;

    Ok(())
}

fn sample_post(uid: &str, date: &str, title: &str, subtitle: &str) -> serde_json::Value {
    serde_json::json!({
        "uid": uid,
        "type": "posts",
        "first_publication_date": date,
        "data": {
            "title": title,
            "subtitle": subtitle,
            "author": "Joseph Oliveira",
            "banner": { "url": null },
            "content": [
                {
                    "heading": "Proin et varius",
                    "body": [
                        {
                            "type": "paragraph",
                            "text": "Lorem ipsum dolor sit amet, consectetur adipiscing elit.",
                            "spans": []
                        }
                    ]
                }
            ]
        }
    })
}
