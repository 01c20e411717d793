use pretty_assertions::assert_eq;
use serde_json::json;
use sqlmap::Value;
use tests::prelude::*;

#[test]
fn include_from_a_namespace_loaded_later() {
    let mut test = MapperTest::new(fixtures::builder());

    assert_ok!(test.load(
        "posts.xml",
        r#"<mapper namespace="posts">
             <select id="recent" resultType="Post">
               select <include refid="shared.columns"><property name="prefix" value="p"/></include>
               from posts p
               <where>
                 <if test="author != null">p.author_id = #{author}</if>
               </where>
             </select>
           </mapper>"#,
    ));
    assert_eq!(test.config.pending_len(), 1);

    assert_ok!(test.load(
        "shared.xml",
        r#"<mapper namespace="shared">
             <sql id="columns">${prefix}.id, ${prefix}.subject</sql>
           </mapper>"#,
    ));
    assert_eq!(test.config.pending_len(), 0);
    assert_ok!(test.finish());

    let bound = assert_ok!(test
        .config
        .bound_sql("posts.recent", &Value::from(json!({ "author": 4 }))));
    assert_sql_eq!(
        bound.sql(),
        "select p.id, p.subject from posts p WHERE p.author_id = ?"
    );
}

#[test]
fn cache_ref_to_a_namespace_loaded_later() {
    let mut test = MapperTest::new(fixtures::builder());

    assert_ok!(test.load(
        "posts.xml",
        r#"<mapper namespace="posts">
             <cache-ref namespace="blogs"/>
             <select id="all">select * from posts</select>
           </mapper>"#,
    ));
    assert_eq!(test.config.pending_len(), 2);
    assert_none!(test.config.cache("posts"));

    assert_ok!(test.load(
        "blogs.xml",
        r#"<mapper namespace="blogs">
             <cache size="64"/>
           </mapper>"#,
    ));
    assert_ok!(test.finish());

    let shared = assert_some!(test.config.cache("posts"));
    assert_eq!(shared.id, "blogs");
    assert_eq!(shared.size, Some(64));

    let all = assert_ok!(test.config.statement("posts.all"));
    assert_eq!(assert_some!(all.cache.as_ref()).id, "blogs");
}

#[test]
fn namespace_cache_wins_over_cache_ref() {
    let mut test = MapperTest::new(fixtures::builder());

    assert_ok!(test.load_all(&[
        (
            "blogs.xml",
            r#"<mapper namespace="blogs"><cache eviction="SOFT"/></mapper>"#,
        ),
        (
            "posts.xml",
            r#"<mapper namespace="posts">
                 <cache-ref namespace="blogs"/>
                 <cache eviction="WEAK"/>
                 <select id="all">select * from posts</select>
               </mapper>"#,
        ),
    ]));
    assert_ok!(test.finish());

    assert_eq!(assert_some!(test.config.cache("posts")).eviction, "WEAK");
    let all = assert_ok!(test.config.statement("posts.all"));
    assert_eq!(assert_some!(all.cache.as_ref()).id, "posts");
}

#[test]
fn discriminator_target_in_another_namespace() {
    let mut test = MapperTest::new(fixtures::builder());

    assert_ok!(test.load(
        "posts.xml",
        r#"<mapper namespace="posts">
             <resultMap id="post" type="Post">
               <id property="id" column="id"/>
               <discriminator column="kind" javaType="string">
                 <case value="featured" resultMap="featured.post"/>
               </discriminator>
             </resultMap>
           </mapper>"#,
    ));
    let post = assert_ok!(test.config.result_map("posts.post"));
    assert!(!post.has_nested_result_maps());

    assert_ok!(test.load(
        "featured.xml",
        r#"<mapper namespace="featured">
             <resultMap id="post" type="Post">
               <association property="author" javaType="Author">
                 <id property="id" column="author_id"/>
               </association>
             </resultMap>
           </mapper>"#,
    ));
    assert_ok!(test.finish());

    // Registering the nested target flips the discriminated map.
    let post = assert_ok!(test.config.result_map("posts.post"));
    assert!(post.has_nested_result_maps());

    // Two namespaces define `post`.
    assert_err!(test.config.result_map("post"));
}
