use suiren::config::Config;
use suiren::content::Question;
use suiren::saving;
use suiren::store::{ContentDraft, Library};

/// Writes a fresh library snapshot containing the three sample passages
///
/// Intended for local development and demos: run it once before starting
/// the server to have something to read. Refuses to overwrite an existing
/// snapshot so it cannot clobber real data.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env();

    if std::path::Path::new(&config.data_file).exists() {
        println!("{} already exists, leaving it untouched", config.data_file);
        return Ok(());
    }
    if let Some(parent) = std::path::Path::new(&config.data_file).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut library = Library::new();
    for (id, draft) in sample_contents() {
        library.create_content(id, draft)?;
    }

    saving::save_library(&library, &config.data_file)?;
    println!(
        "seeded {} passages into {}",
        library.contents.len(),
        config.data_file
    );
    Ok(())
}

fn sample_contents() -> Vec<(String, ContentDraft)> {
    vec![
        (
            "1-1".to_string(),
            ContentDraft {
                title: "ももたろう".to_string(),
                level: "初級修了レベル".to_string(),
                level_code: "beginner".to_string(),
                text: "むかし、むかし、あるところに、おじいさんとおばあさんがいました。\n\
                       おじいさんは山にしばかりに、おばあさんは川に洗濯に行きました。\n\
                       おばあさんが川で洗濯をしていると、大きな桃が流れてきました。\n\
                       「あら、大きな桃だこと。おじいさんのお土産にしましょう。」\n\
                       おばあさんは桃を家に持って帰りました。"
                    .to_string(),
                explanation: None,
                word_count: None,
                character_count: None,
                images: Vec::new(),
                thumbnail: None,
                questions: vec![
                    Question {
                        id: 1,
                        question: "おじいさんは何をしに山に行きましたか。".to_string(),
                        options: vec![
                            "しばかりに".to_string(),
                            "桃を取りに".to_string(),
                            "洗濯に".to_string(),
                            "買い物に".to_string(),
                        ],
                        correct_answer: 0,
                        explanation: None,
                    },
                    Question {
                        id: 2,
                        question: "川に何が流れてきましたか。".to_string(),
                        options: vec![
                            "りんご".to_string(),
                            "桃".to_string(),
                            "みかん".to_string(),
                            "なし".to_string(),
                        ],
                        correct_answer: 1,
                        explanation: None,
                    },
                ],
            },
        ),
        (
            "2-1".to_string(),
            ContentDraft {
                title: "仏教".to_string(),
                level: "中級レベル".to_string(),
                level_code: "intermediate".to_string(),
                text: "仏教は約2500年前にインドで始まりました。\n\
                       お釈迦様という人が悩みや苦しみから解放される方法を教えました。\n\
                       仏教は平和と慈悲の心を大切にします。\n\
                       現在、世界中の多くの人々が仏教を信仰しています。"
                    .to_string(),
                explanation: None,
                word_count: None,
                character_count: None,
                images: Vec::new(),
                thumbnail: None,
                questions: vec![
                    Question {
                        id: 1,
                        question: "仏教はいつ頃始まりましたか。".to_string(),
                        options: vec![
                            "約1500年前".to_string(),
                            "約2000年前".to_string(),
                            "約2500年前".to_string(),
                            "約3000年前".to_string(),
                        ],
                        correct_answer: 2,
                        explanation: None,
                    },
                    Question {
                        id: 2,
                        question: "仏教が大切にするものは何ですか。".to_string(),
                        options: vec![
                            "富と名声".to_string(),
                            "平和と慈悲".to_string(),
                            "力と権力".to_string(),
                            "知識と技術".to_string(),
                        ],
                        correct_answer: 1,
                        explanation: None,
                    },
                ],
            },
        ),
        (
            "3-1".to_string(),
            ContentDraft {
                title: "エチオピアのコーヒー".to_string(),
                level: "上級レベル".to_string(),
                level_code: "advanced".to_string(),
                text: "エチオピアはコーヒーの発祥地として知られています。\n\
                       伝説によると、羊飼いの少年がコーヒーの実を食べた羊が元気になることを発見したのが始まりとされています。\n\
                       エチオピアのコーヒー文化は非常に深く、コーヒーセレモニーという伝統的な儀式があります。\n\
                       この儀式では、生豆を焙煎し、挽いて、丁寧にコーヒーを淹れます。"
                    .to_string(),
                explanation: None,
                word_count: None,
                character_count: None,
                images: Vec::new(),
                thumbnail: None,
                questions: vec![
                    Question {
                        id: 1,
                        question: "エチオピアはコーヒーの何として知られていますか。".to_string(),
                        options: vec![
                            "最大の輸出国".to_string(),
                            "発祥地".to_string(),
                            "最高品質の産地".to_string(),
                            "消費量が最も多い国".to_string(),
                        ],
                        correct_answer: 1,
                        explanation: None,
                    },
                    Question {
                        id: 2,
                        question: "エチオピアの伝統的なコーヒーの儀式を何と言いますか。".to_string(),
                        options: vec![
                            "コーヒータイム".to_string(),
                            "コーヒーセレモニー".to_string(),
                            "コーヒーパーティー".to_string(),
                            "コーヒーフェスティバル".to_string(),
                        ],
                        correct_answer: 1,
                        explanation: None,
                    },
                ],
            },
        ),
    ]
}
