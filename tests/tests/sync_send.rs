use serde_json::json;
use sqlmap::{Configuration, Value};
use std::{sync::Arc, thread};
use tests::prelude::*;

fn assert_sync_send<T: Send + Sync>(val: T) -> T {
    val
}

#[test]
fn finished_configuration_is_shared_between_threads() {
    let mut test = MapperTest::new(fixtures::builder());
    assert_ok!(test.load(
        "posts.xml",
        r#"<mapper namespace="posts">
             <select id="find" resultType="Post">
               select * from posts <where><if test="id != null">id = #{id}</if></where>
             </select>
           </mapper>"#,
    ));
    assert_ok!(test.finish());

    let MapperTest { config, .. } = test;
    let config: Arc<Configuration> = Arc::new(assert_sync_send(config));

    let handles: Vec<_> = (0..4)
        .map(|id| {
            let config = config.clone();
            thread::spawn(move || {
                let bound = config.bound_sql("posts.find", &Value::from(json!({ "id": id })))?;
                Ok::<_, sqlmap::Error>(bound.sql().to_string())
            })
        })
        .collect();

    for handle in handles {
        let sql = assert_ok!(handle.join().expect("thread panicked"));
        assert_sql_eq!(sql, "select * from posts WHERE id = ?");
    }
}
