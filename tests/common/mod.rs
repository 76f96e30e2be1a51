//! Shared fixtures: in-memory `.bbrz` archives.

#![allow(dead_code)]

use std::io::{Cursor, Write};

/// A minimal finished-game replay between two named teams.
pub fn replay_xml(home: &str, home_coach: &str, away: &str, away_coach: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\
         <Replay>\
           <ReplayStep><BoardState><Turn>1</Turn></BoardState></ReplayStep>\
           <ReplayStep>\
             <RulesEventGameFinished>\
               <MatchResult>\
                 <CoachResults>\
                   <CoachResult><TeamResult>\
                     <TeamData><Name>{home}</Name><Value>1100</Value><IdRace>1</IdRace></TeamData>\
                     <PlayerResults>\
                       <PlayerResult>\
                         <PlayerData><Name>Griff</Name><IdPlayerTypes>7</IdPlayerTypes><ListSkills>(1)</ListSkills></PlayerData>\
                         <Statistics><MVP>1</MVP></Statistics>\
                       </PlayerResult>\
                     </PlayerResults>\
                   </TeamResult></CoachResult>\
                   <CoachResult><TeamResult>\
                     <TeamData><Name>{away}</Name><Value>1000</Value><IdRace>3</IdRace></TeamData>\
                   </TeamResult></CoachResult>\
                 </CoachResults>\
                 <Row>\
                   <TeamHomeName>{home}</TeamHomeName><TeamAwayName>{away}</TeamAwayName>\
                   <CoachHomeName>{home_coach}</CoachHomeName><CoachAwayName>{away_coach}</CoachAwayName>\
                   <HomeScore>2</HomeScore><AwayScore>1</AwayScore>\
                 </Row>\
               </MatchResult>\
             </RulesEventGameFinished>\
           </ReplayStep>\
         </Replay>"
    )
}

/// Zip `xml` as the single entry of a `.bbrz` archive.
pub fn bbrz(xml: &str) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file("replay.xml", zip::write::SimpleFileOptions::default())
        .unwrap();
    writer.write_all(xml.as_bytes()).unwrap();
    writer.finish().unwrap().into_inner()
}

/// Archive for `home` vs `away` with fixed coach names.
pub fn match_archive(home: &str, away: &str) -> Vec<u8> {
    bbrz(&replay_xml(home, "alice", away, "bob"))
}
